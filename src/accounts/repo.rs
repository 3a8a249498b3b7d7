use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::accounts::repo_types::{Account, AccountRow, ListName, NewAccount, ProfileUpdate};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. Carries the field name.
    #[error("{0} already exists")]
    Duplicate(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence of account records.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
    /// Inserts a new account. Fails with `Duplicate` on a taken email or username.
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, StoreError>;
    /// Returns false when no account had that id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn push_to_list(
        &self,
        id: Uuid,
        list: ListName,
        movie: Value,
    ) -> Result<Option<Account>, StoreError>;
    /// Removes every element of `list` whose `id` equals `movie_id`.
    async fn pull_from_list(
        &self,
        id: Uuid,
        list: ListName,
        movie_id: Value,
    ) -> Result<Option<Account>, StoreError>;
}

const ACCOUNT_COLUMNS: &str = "id, email, user_name, first_name, last_name, city, state, country, \
     bio, profile_picture, password_hash, ratings, watched, watch_list, liked, disliked, \
     playlists, created_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Maps unique violations onto `StoreError::Duplicate` by constraint name.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(c) if c.contains("user_name") => "username",
                _ => "email",
            };
            return StoreError::Duplicate(field);
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO accounts (id, email, user_name, first_name, last_name, city, state,
                                  country, bio, profile_picture, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&account.email)
            .bind(&account.user_name)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.city)
            .bind(&account.state)
            .bind(&account.country)
            .bind(&account.bio)
            .bind(&account.profile_picture)
            .bind(&account.password_hash)
            .fetch_one(&self.db)
            .await
            .map_err(map_write_error)?;
        Ok(row.into())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            r#"
            UPDATE accounts
               SET email = COALESCE($2, email),
                   user_name = COALESCE($3, user_name),
                   first_name = COALESCE($4, first_name),
                   last_name = COALESCE($5, last_name),
                   city = COALESCE($6, city),
                   state = COALESCE($7, state),
                   country = COALESCE($8, country),
                   bio = COALESCE($9, bio),
                   profile_picture = COALESCE($10, profile_picture)
             WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .bind(update.email)
            .bind(update.user_name)
            .bind(update.first_name)
            .bind(update.last_name)
            .bind(update.city)
            .bind(update.state)
            .bind(update.country)
            .bind(update.bio)
            .bind(update.profile_picture)
            .fetch_optional(&self.db)
            .await
            .map_err(map_write_error)?;
        Ok(row.map(Account::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn push_to_list(
        &self,
        id: Uuid,
        list: ListName,
        movie: Value,
    ) -> Result<Option<Account>, StoreError> {
        // Column names come from the closed ListName set, never from input.
        let col = list.column();
        let sql = format!(
            r#"
            UPDATE accounts
               SET {col} = {col} || jsonb_build_array($2::jsonb)
             WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .bind(Json(movie))
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Account::from))
    }

    async fn pull_from_list(
        &self,
        id: Uuid,
        list: ListName,
        movie_id: Value,
    ) -> Result<Option<Account>, StoreError> {
        let col = list.column();
        let sql = format!(
            r#"
            UPDATE accounts
               SET {col} = COALESCE(
                   (SELECT jsonb_agg(e.value ORDER BY e.ord)
                      FROM jsonb_array_elements({col}) WITH ORDINALITY AS e(value, ord)
                     WHERE e.value -> 'id' IS DISTINCT FROM $2::jsonb),
                   '[]'::jsonb)
             WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id)
            .bind(Json(movie_id))
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Account::from))
    }
}
