use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record as held by the store.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub password_hash: String, // Argon2 PHC string, never plaintext
    pub ratings: Vec<Value>,
    pub watched: Vec<Value>,
    pub watch_list: Vec<Value>,
    pub liked: Vec<Value>,
    pub disliked: Vec<Value>,
    pub playlists: Vec<Value>,
    pub created_at: OffsetDateTime,
}

impl Account {
    /// "first last", skipping whichever half is missing.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    pub fn list_mut(&mut self, list: ListName) -> &mut Vec<Value> {
        match list {
            ListName::Ratings => &mut self.ratings,
            ListName::Watched => &mut self.watched,
            ListName::WatchList => &mut self.watch_list,
            ListName::Liked => &mut self.liked,
            ListName::Disliked => &mut self.disliked,
            ListName::Playlists => &mut self.playlists,
        }
    }

    /// Applies the fields present in `update`, leaving the rest untouched.
    pub fn apply(&mut self, update: ProfileUpdate) {
        let ProfileUpdate {
            email,
            user_name,
            first_name,
            last_name,
            city,
            state,
            country,
            bio,
            profile_picture,
        } = update;
        if let Some(v) = email {
            self.email = v;
        }
        if user_name.is_some() {
            self.user_name = user_name;
        }
        if first_name.is_some() {
            self.first_name = first_name;
        }
        if last_name.is_some() {
            self.last_name = last_name;
        }
        if city.is_some() {
            self.city = city;
        }
        if state.is_some() {
            self.state = state;
        }
        if country.is_some() {
            self.country = country;
        }
        if bio.is_some() {
            self.bio = bio;
        }
        if profile_picture.is_some() {
            self.profile_picture = profile_picture;
        }
    }
}

/// Row shape of the `accounts` table.
#[derive(Debug, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub password_hash: String,
    pub ratings: Json<Vec<Value>>,
    pub watched: Json<Vec<Value>>,
    pub watch_list: Json<Vec<Value>>,
    pub liked: Json<Vec<Value>>,
    pub disliked: Json<Vec<Value>>,
    pub playlists: Json<Vec<Value>>,
    pub created_at: OffsetDateTime,
}

impl From<AccountRow> for Account {
    fn from(r: AccountRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            user_name: r.user_name,
            first_name: r.first_name,
            last_name: r.last_name,
            city: r.city,
            state: r.state,
            country: r.country,
            bio: r.bio,
            profile_picture: r.profile_picture,
            password_hash: r.password_hash,
            ratings: r.ratings.0,
            watched: r.watched.0,
            watch_list: r.watch_list.0,
            liked: r.liked.0,
            disliked: r.disliked.0,
            playlists: r.playlists.0,
            created_at: r.created_at,
        }
    }
}

/// Public part of the account returned to the client. Carries no credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: Uuid,
    pub email: String,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub ratings: Vec<Value>,
    pub watched: Vec<Value>,
    pub watch_list: Vec<Value>,
    pub liked: Vec<Value>,
    pub disliked: Vec<Value>,
    pub playlists: Vec<Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Account> for PublicAccount {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            user_name: a.user_name,
            first_name: a.first_name,
            last_name: a.last_name,
            city: a.city,
            state: a.state,
            country: a.country,
            bio: a.bio,
            profile_picture: a.profile_picture,
            ratings: a.ratings,
            watched: a.watched,
            watch_list: a.watch_list,
            liked: a.liked,
            disliked: a.disliked,
            playlists: a.playlists,
            created_at: a.created_at,
        }
    }
}

/// Everything needed to insert a fresh account. Lists start empty.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub password_hash: String,
}

/// Partial profile update; `None` means "leave as is".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

/// The movie collections a caller may mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListName {
    Ratings,
    Watched,
    WatchList,
    Liked,
    Disliked,
    Playlists,
}

impl ListName {
    pub const ALL: [ListName; 6] = [
        ListName::Ratings,
        ListName::Watched,
        ListName::WatchList,
        ListName::Liked,
        ListName::Disliked,
        ListName::Playlists,
    ];

    /// Name used in URLs and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            ListName::Ratings => "ratings",
            ListName::Watched => "watched",
            ListName::WatchList => "watchList",
            ListName::Liked => "liked",
            ListName::Disliked => "disliked",
            ListName::Playlists => "playlists",
        }
    }

    /// Column in the `accounts` table.
    pub fn column(self) -> &'static str {
        match self {
            ListName::WatchList => "watch_list",
            other => other.as_str(),
        }
    }
}

impl std::str::FromStr for ListName {
    type Err = UnknownList;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| UnknownList(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown list {0:?}")]
pub struct UnknownList(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            user_name: Some("ax".into()),
            first_name: Some("Ada".into()),
            last_name: None,
            city: None,
            state: None,
            country: None,
            bio: None,
            profile_picture: None,
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
            ratings: vec![],
            watched: vec![json!({"id": 1})],
            watch_list: vec![],
            liked: vec![],
            disliked: vec![],
            playlists: vec![],
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn list_names_accept_only_the_closed_set() {
        for l in ListName::ALL {
            assert_eq!(l.as_str().parse::<ListName>().unwrap(), l);
        }
        assert!("password_hash".parse::<ListName>().is_err());
        assert!("watch_list".parse::<ListName>().is_err());
        assert_eq!(ListName::WatchList.column(), "watch_list");
    }

    #[test]
    fn public_projection_has_no_credential() {
        let public = PublicAccount::from(sample());
        let json = serde_json::to_value(&public).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("$argon2"));
        assert_eq!(json["watched"], json!([{"id": 1}]));
        assert!(json.get("watchList").is_some());
    }

    #[test]
    fn apply_leaves_absent_fields_untouched() {
        let mut account = sample();
        account.apply(ProfileUpdate {
            city: Some("Lyon".into()),
            ..Default::default()
        });
        assert_eq!(account.city.as_deref(), Some("Lyon"));
        assert_eq!(account.first_name.as_deref(), Some("Ada"));
        assert_eq!(account.email, "a@x.com");
    }

    #[test]
    fn display_name_joins_present_parts() {
        let mut account = sample();
        assert_eq!(account.display_name().as_deref(), Some("Ada"));
        account.last_name = Some("Lovelace".into());
        assert_eq!(account.display_name().as_deref(), Some("Ada Lovelace"));
        account.first_name = None;
        account.last_name = None;
        assert_eq!(account.display_name(), None);
    }
}
