use std::{sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::accounts::{
    memory::MemoryAccountStore,
    repo::{AccountStore, PgAccountStore},
};
use crate::auth::jwt::JwtKeys;
use crate::config::{AppConfig, StoreKind};

#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub store: Arc<dyn AccountStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let store = match config.store {
            StoreKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL missing")?;
                let db = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                Arc::new(PgAccountStore::new(db)) as Arc<dyn AccountStore>
            }
            StoreKind::Memory => {
                tracing::warn!("using in-memory account store; data is lost on restart");
                Arc::new(MemoryAccountStore::new()) as Arc<dyn AccountStore>
            }
        };

        Ok(Self::from_parts(&config, store))
    }

    pub fn from_parts(config: &AppConfig, store: Arc<dyn AccountStore>) -> Self {
        let jwt = JwtKeys::new(
            config.jwt.secret.as_bytes(),
            Duration::from_secs(config.jwt.ttl_seconds),
        );
        Self { jwt, store }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = AppConfig {
            store: StoreKind::Memory,
            database_url: None,
            max_connections: 1,
            jwt: crate::config::JwtConfig {
                secret: "test-secret".into(),
                ttl_seconds: crate::config::DEFAULT_TOKEN_TTL_SECONDS,
            },
        };
        Self::from_parts(&config, Arc::new(MemoryAccountStore::new()))
    }
}
