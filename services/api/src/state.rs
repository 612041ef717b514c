use std::sync::Arc;

use anyhow::Context as _;

use crate::config::{ApiConfig, BackendFlag, StorageBackend};
use crate::infra::jsondb::JsonDb;
use crate::infra::movies::MovieClient;
use crate::infra::store::{BackendInspector, FavoriteStore, LinkStore, ReviewStore, Stores, UserStore};

/// Shared application state. The backend is resolved exactly once, in
/// [`AppState::init`]; everything downstream goes through [`Stores`].
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub backend: StorageBackend,
    pub stores: Stores,
    pub inspector: BackendInspector,
    pub movies: MovieClient,
    pub flag: BackendFlag,
}

impl AppState {
    pub async fn init(config: Arc<ApiConfig>) -> anyhow::Result<Self> {
        let flag = BackendFlag::new(&config.data_dir);
        let backend = flag.load()?;
        let movies = MovieClient::new(
            config.omdb_api_key.clone(),
            config.youtube_api_key.clone(),
        )?;
        let (stores, inspector) = match backend {
            StorageBackend::Database => {
                let url = config
                    .database_url
                    .clone()
                    .context("DATABASE_URL is required in database mode")?;
                let db = sea_orm::Database::connect(&url)
                    .await
                    .context("connect database")?;
                (
                    Stores::database(db.clone()),
                    BackendInspector::Db { db, url },
                )
            }
            StorageBackend::JsonFiles => {
                let db = JsonDb::open(&config.data_dir).await?;
                (
                    Stores::json(db.clone()),
                    BackendInspector::Json {
                        db,
                        data_dir: config.data_dir.clone(),
                    },
                )
            }
        };
        tracing::info!(backend = backend.as_str(), "storage backend selected");
        Ok(Self {
            config,
            backend,
            stores,
            inspector,
            movies,
            flag,
        })
    }

    pub fn users(&self) -> UserStore {
        self.stores.users.clone()
    }

    pub fn links(&self) -> LinkStore {
        self.stores.links.clone()
    }

    pub fn reviews(&self) -> ReviewStore {
        self.stores.reviews.clone()
    }

    pub fn favorites(&self) -> FavoriteStore {
        self.stores.favorites.clone()
    }
}
