use serde::Deserialize;
use serde_json::Value;

/// Body of the list mutation routes: `{"movie": {...}}`.
#[derive(Debug, Deserialize)]
pub struct MovieBody {
    pub movie: Value,
}
