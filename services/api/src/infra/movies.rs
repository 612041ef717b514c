//! External movie catalog and trailer lookups.
//!
//! OMDb answers catalog search and detail lookups, the YouTube Data API
//! answers trailer searches. Upstream "no results" responses are normal
//! outcomes (`Ok` with empty data); only transport failures become errors.

use std::time::Duration;

use anyhow::Context as _;
use chrono::Utc;
use serde::Deserialize;

use cinelink_domain::movie::{MovieSummary, ProbeStatus};

use crate::domain::repository::MovieCatalogPort;
use crate::domain::types::ApiReport;
use crate::error::ApiError;

const OMDB_BASE: &str = "https://www.omdbapi.com/";
const YOUTUBE_BASE: &str = "https://www.googleapis.com/youtube/v3/search";

/// Per-request ceiling for status probes. Slower than this counts as a
/// timeout on the admin panel.
const PROBE_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Clone)]
pub struct MovieClient {
    http: reqwest::Client,
    omdb_base: String,
    youtube_base: String,
    omdb_key: Option<String>,
    youtube_key: Option<String>,
}

impl MovieClient {
    pub fn new(omdb_key: Option<String>, youtube_key: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build http client")?;
        Ok(Self {
            http,
            omdb_base: OMDB_BASE.to_owned(),
            youtube_base: YOUTUBE_BASE.to_owned(),
            omdb_key,
            youtube_key,
        })
    }

    /// Point the client at alternate endpoints (used by tests).
    pub fn with_endpoints(mut self, omdb_base: String, youtube_base: String) -> Self {
        self.omdb_base = omdb_base;
        self.youtube_base = youtube_base;
        self
    }

    fn omdb_key(&self) -> Result<&str, ApiError> {
        self.omdb_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("OMDB_API_KEY is not configured").into())
    }

    fn youtube_key(&self) -> Result<&str, ApiError> {
        self.youtube_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("YOUTUBE_API_KEY is not configured").into())
    }

    async fn probe_one(&self, name: &str, description: &str, url: &str) -> ApiReport {
        let outcome = self
            .http
            .get(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;
        let (status, status_code) = match outcome {
            // Any HTTP answer means the service is reachable; the code is
            // reported as-is (a keyless probe typically gets 401).
            Ok(resp) => (ProbeStatus::Online, Some(resp.status().as_u16())),
            Err(e) if e.is_timeout() => (ProbeStatus::Timeout, None),
            Err(e) if e.is_connect() => (ProbeStatus::Offline, None),
            Err(_) => (ProbeStatus::Error, None),
        };
        ApiReport {
            name: name.to_owned(),
            description: description.to_owned(),
            status,
            status_code,
            checked_at: Utc::now(),
        }
    }
}

// ── Upstream wire formats ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<OmdbSearchItem>,
}

#[derive(Deserialize)]
struct OmdbSearchItem {
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Poster")]
    poster: Option<String>,
}

#[derive(Deserialize)]
struct OmdbDetailResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Plot")]
    plot: Option<String>,
    #[serde(rename = "imdbRating")]
    rating: Option<String>,
}

#[derive(Deserialize)]
struct YoutubeSearchResponse {
    #[serde(default)]
    items: Vec<YoutubeItem>,
}

#[derive(Deserialize)]
struct YoutubeItem {
    id: YoutubeVideoId,
}

#[derive(Deserialize)]
struct YoutubeVideoId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

/// OMDb uses the literal string `"N/A"` for absent fields.
fn clean(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && v != "N/A")
}

fn parse_search(raw: &str) -> anyhow::Result<Vec<MovieSummary>> {
    let body: OmdbSearchResponse =
        serde_json::from_str(raw).context("parse catalog search response")?;
    if body.response != "True" {
        return Ok(Vec::new());
    }
    Ok(body
        .search
        .into_iter()
        .map(|item| MovieSummary {
            imdb_id: item.imdb_id,
            title: item.title,
            year: clean(item.year),
            poster: clean(item.poster),
            plot: None,
            rating: None,
        })
        .collect())
}

fn parse_detail(raw: &str) -> anyhow::Result<Option<MovieSummary>> {
    let body: OmdbDetailResponse =
        serde_json::from_str(raw).context("parse catalog detail response")?;
    if body.response != "True" {
        return Ok(None);
    }
    let (Some(imdb_id), Some(title)) = (body.imdb_id, body.title) else {
        return Ok(None);
    };
    Ok(Some(MovieSummary {
        imdb_id,
        title,
        year: clean(body.year),
        poster: clean(body.poster),
        plot: clean(body.plot),
        rating: clean(body.rating),
    }))
}

fn parse_trailer(raw: &str) -> anyhow::Result<Option<String>> {
    let body: YoutubeSearchResponse =
        serde_json::from_str(raw).context("parse trailer search response")?;
    Ok(body
        .items
        .into_iter()
        .find_map(|item| item.id.video_id)
        .map(|id| format!("https://www.youtube.com/watch?v={id}")))
}

impl MovieCatalogPort for MovieClient {
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, ApiError> {
        let key = self.omdb_key()?;
        let raw = self
            .http
            .get(&self.omdb_base)
            .query(&[("apikey", key), ("s", query)])
            .send()
            .await
            .context("catalog search request")?
            .text()
            .await
            .context("read catalog search response")?;
        Ok(parse_search(&raw)?)
    }

    async fn lookup(&self, imdb_id: &str) -> Result<Option<MovieSummary>, ApiError> {
        let key = self.omdb_key()?;
        let raw = self
            .http
            .get(&self.omdb_base)
            .query(&[("apikey", key), ("i", imdb_id), ("plot", "full")])
            .send()
            .await
            .context("catalog lookup request")?
            .text()
            .await
            .context("read catalog lookup response")?;
        Ok(parse_detail(&raw)?)
    }

    async fn trailer(&self, title: &str) -> Result<Option<String>, ApiError> {
        let key = self.youtube_key()?;
        let query = format!("{title} trailer");
        let raw = self
            .http
            .get(&self.youtube_base)
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", "1"),
                ("q", &query),
                ("key", key),
            ])
            .send()
            .await
            .context("trailer search request")?
            .text()
            .await
            .context("read trailer search response")?;
        Ok(parse_trailer(&raw)?)
    }

    async fn probe(&self) -> Vec<ApiReport> {
        vec![
            self.probe_one("OMDb API", "Movie catalog and details", &self.omdb_base)
                .await,
            self.probe_one("YouTube Data API", "Trailer search", &self.youtube_base)
                .await,
        ]
    }
}
