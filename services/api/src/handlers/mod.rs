pub mod admin;
pub mod auth;
pub mod favorites;
pub mod health;
pub mod links;
pub mod movies;
pub mod reviews;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Plain `{ "message": ... }` acknowledgement body.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

/// Serialize `DateTime<Utc>` as RFC 3339 with 3-digit fractional seconds.
/// Matches the ISO strings the legacy flat files were written with.
pub fn to_rfc3339_ms<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
