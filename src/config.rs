use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_seconds: u64,
}

/// Which account store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown ACCOUNT_STORE {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub jwt: JwtConfig,
}

pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 3600;
/// Upper bound on `JWT_TTL_SECONDS`: 30 days.
pub const MAX_TOKEN_TTL_SECONDS: u64 = 30 * 24 * 3600;

/// Parses `JWT_TTL_SECONDS`; unset means the default.
fn parse_ttl(raw: Option<&str>) -> anyhow::Result<u64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TOKEN_TTL_SECONDS);
    };
    let ttl: u64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("JWT_TTL_SECONDS must be a number, got {raw:?}"))?;
    if ttl == 0 || ttl > MAX_TOKEN_TTL_SECONDS {
        anyhow::bail!("JWT_TTL_SECONDS must be between 1 and {MAX_TOKEN_TTL_SECONDS}");
    }
    Ok(ttl)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("ACCOUNT_STORE") {
            Ok(v) => v.parse()?,
            Err(_) => StoreKind::Postgres,
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreKind::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when ACCOUNT_STORE=postgres");
        }

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            ttl_seconds: parse_ttl(std::env::var("JWT_TTL_SECONDS").ok().as_deref())?,
        };

        Ok(Self {
            store,
            database_url,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_kind_parses_known_values() {
        assert_eq!("postgres".parse::<StoreKind>().unwrap(), StoreKind::Postgres);
        assert_eq!(" Memory ".parse::<StoreKind>().unwrap(), StoreKind::Memory);
        assert!("mongo".parse::<StoreKind>().is_err());
    }

    #[test]
    fn token_ttl_is_bounded() {
        assert_eq!(parse_ttl(None).unwrap(), DEFAULT_TOKEN_TTL_SECONDS);
        assert_eq!(parse_ttl(Some(" 900 ")).unwrap(), 900);
        assert_eq!(
            parse_ttl(Some(&MAX_TOKEN_TTL_SECONDS.to_string())).unwrap(),
            MAX_TOKEN_TTL_SECONDS
        );
        assert!(parse_ttl(Some("0")).is_err());
        assert!(parse_ttl(Some("18446744073709551615")).is_err());
        assert!(parse_ttl(Some("soon")).is_err());
    }
}
