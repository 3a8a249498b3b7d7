use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::accounts::{
    repo::{AccountStore, StoreError},
    repo_types::{Account, ListName, NewAccount, ProfileUpdate},
};

/// In-process store with the same uniqueness rules as the `accounts` table.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<Vec<Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }
}

/// Checks email/username uniqueness against everything except `skip`.
fn check_unique(
    accounts: &[Account],
    skip: Option<Uuid>,
    email: &str,
    user_name: Option<&str>,
) -> Result<(), StoreError> {
    for a in accounts.iter().filter(|a| Some(a.id) != skip) {
        if a.email == email {
            return Err(StoreError::Duplicate("email"));
        }
        if user_name.is_some() && a.user_name.as_deref() == user_name {
            return Err(StoreError::Duplicate("username"));
        }
    }
    Ok(())
}

/// Movie id equality as jsonb sees it: numbers compare by value, so `603 == 603.0`.
fn same_movie_id(stored: Option<&Value>, wanted: &Value) -> bool {
    match (stored, wanted) {
        (Some(Value::Number(a)), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        (Some(v), w) => v == w,
        (None, _) => false,
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        check_unique(&accounts, None, &new.email, new.user_name.as_deref())?;
        let account = Account {
            id: Uuid::new_v4(),
            email: new.email,
            user_name: new.user_name,
            first_name: new.first_name,
            last_name: new.last_name,
            city: new.city,
            state: new.state,
            country: new.country,
            bio: new.bio,
            profile_picture: new.profile_picture,
            password_hash: new.password_hash,
            ratings: Vec::new(),
            watched: Vec::new(),
            watch_list: Vec::new(),
            liked: Vec::new(),
            disliked: Vec::new(),
            playlists: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.accounts.write().await;
        let Some(idx) = accounts.iter().position(|a| a.id == id) else {
            return Ok(None);
        };
        let mut updated = accounts[idx].clone();
        updated.apply(update);
        check_unique(
            &accounts,
            Some(id),
            &updated.email,
            updated.user_name.as_deref(),
        )?;
        accounts[idx] = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut accounts = self.accounts.write().await;
        let before = accounts.len();
        accounts.retain(|a| a.id != id);
        Ok(accounts.len() != before)
    }

    async fn push_to_list(
        &self,
        id: Uuid,
        list: ListName,
        movie: Value,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.accounts.write().await;
        Ok(accounts.iter_mut().find(|a| a.id == id).map(|a| {
            a.list_mut(list).push(movie);
            a.clone()
        }))
    }

    async fn pull_from_list(
        &self,
        id: Uuid,
        list: ListName,
        movie_id: Value,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.accounts.write().await;
        Ok(accounts.iter_mut().find(|a| a.id == id).map(|a| {
            a.list_mut(list)
                .retain(|m| !same_movie_id(m.get("id"), &movie_id));
            a.clone()
        }))
    }
}
