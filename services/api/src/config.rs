use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// API service configuration loaded from environment variables.
///
/// The storage backend selection is deliberately NOT an env var: it lives in
/// a small JSON file ([`BackendFlag`]) so the admin toggle endpoint can
/// rewrite it and have the new value picked up on the next start.
#[derive(Debug)]
pub struct ApiConfig {
    /// TCP port for the HTTP server (default 3000). Env var: `API_PORT`.
    pub api_port: u16,
    /// Database connection URL. Required only in database mode.
    pub database_url: Option<String>,
    /// Directory holding the flat-file collections and the backend flag
    /// (default `./data`). Env var: `DATA_DIR`.
    pub data_dir: PathBuf,
    /// HMAC secret for session tokens. Env var: `SESSION_SECRET`.
    pub session_secret: String,
    /// Movie catalog API key. Env var: `OMDB_API_KEY`.
    pub omdb_api_key: Option<String>,
    /// Trailer search API key. Env var: `YOUTUBE_API_KEY`.
    pub youtube_api_key: Option<String>,
    /// Set when running under a process supervisor that restarts on exit,
    /// so the backend toggle can self-restart. Env var: `CINELINK_SUPERVISED`.
    pub supervised: bool,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self {
            api_port: std::env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: std::env::var("DATABASE_URL").ok(),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            session_secret: std::env::var("SESSION_SECRET").expect("SESSION_SECRET"),
            omdb_api_key: std::env::var("OMDB_API_KEY").ok(),
            youtube_api_key: std::env::var("YOUTUBE_API_KEY").ok(),
            supervised: std::env::var("CINELINK_SUPERVISED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Which persistence backend answers the storage façade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    Database,
    JsonFiles,
}

impl StorageBackend {
    pub fn toggled(self) -> Self {
        match self {
            Self::Database => Self::JsonFiles,
            Self::JsonFiles => Self::Database,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::JsonFiles => "json-files",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct BackendFlagFile {
    backend: StorageBackend,
}

/// The persisted backend selection, stored as `backend.json` in the data
/// directory. Read once at startup; rewritten by the admin toggle. A change
/// takes effect only after a process restart.
#[derive(Debug, Clone)]
pub struct BackendFlag {
    path: PathBuf,
}

impl BackendFlag {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("backend.json"),
        }
    }

    /// Load the persisted selection. A missing file is initialized to
    /// `Database` (the legacy default); malformed contents fail loudly.
    pub fn load(&self) -> anyhow::Result<StorageBackend> {
        if !self.path.exists() {
            self.store(StorageBackend::Database)?;
            return Ok(StorageBackend::Database);
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read backend flag {}", self.path.display()))?;
        let file: BackendFlagFile = serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in backend flag {}", self.path.display()))?;
        Ok(file.backend)
    }

    pub fn store(&self, backend: StorageBackend) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create data dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&BackendFlagFile { backend })?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("write backend flag {}", self.path.display()))?;
        Ok(())
    }
}
