use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shortened URL record from the `mappings` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Mapping {
    pub id: String,
    pub url: String,
    pub short_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_count: i64,
}

impl Mapping {
    /// Build a fresh, not yet persisted mapping with a new id, zero accesses
    /// and both timestamps set to `now`.
    pub fn new(url: impl Into<String>, short_code: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            short_code: short_code.into(),
            created_at: now,
            updated_at: now,
            access_count: 0,
        }
    }
}

/// Body of `POST /shorten` and `PUT /shorten/:code`.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

/// A mapping as returned by the JSON API, with the public short link attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResponse {
    #[serde(flatten)]
    pub mapping: Mapping,
    pub short_url: String,
}

impl MappingResponse {
    pub fn new(mapping: Mapping, base_url: &str) -> Self {
        let short_url = format!("{}/s/{}", base_url, mapping.short_code);
        Self { mapping, short_url }
    }
}

/// Error payload for every non-2xx JSON response except 409.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
