//! External movie-catalog types.
//!
//! Movies are not stored locally; `movie_id` is an opaque identifier issued
//! by the external catalog and resolved against it at read time.

use serde::{Deserialize, Serialize};

/// A movie as reported by the external catalog.
///
/// Every field besides the id is best-effort: the catalog may return `"N/A"`
/// or omit fields entirely, and an empty search result is a normal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub imdb_id: String,
    pub title: String,
    pub year: Option<String>,
    pub poster: Option<String>,
    pub plot: Option<String>,
    pub rating: Option<String>,
}

/// Health of one external API as seen from the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Online,
    Offline,
    Timeout,
    Error,
}

impl ProbeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_probe_status_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProbeStatus::Online).unwrap(),
            "\"online\""
        );
        assert_eq!(
            serde_json::to_string(&ProbeStatus::Timeout).unwrap(),
            "\"timeout\""
        );
    }

    #[test]
    fn should_deserialize_movie_with_missing_optionals() {
        let json = r#"{"imdb_id":"tt001","title":"Site","year":null,"poster":null,"plot":null,"rating":null}"#;
        let movie: MovieSummary = serde_json::from_str(json).unwrap();
        assert_eq!(movie.imdb_id, "tt001");
        assert!(movie.year.is_none());
    }
}
