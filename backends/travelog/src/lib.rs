pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod utils;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{
    config::Config,
    utils::{jwt::TokenKeys, storage::Uploads},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub tokens: TokenKeys,
    pub uploads: Uploads,
}

impl AppState {
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database_url).await?;
        db::prepare_db(&pool).await?;

        let uploads = Uploads::new(&config.upload_dir, &config.public_base_url);
        uploads.ensure_dir().await?;

        Ok(Self {
            pool,
            tokens: TokenKeys::from_secret(&config.jwt_secret, config.token_ttl_hours),
            uploads,
        })
    }

    /// Removes uploads no row references any more, e.g. files whose trip
    /// was deleted while the file removal failed.
    pub async fn sweep_uploads(&self) -> anyhow::Result<usize> {
        let referenced = db::referenced_uploads(&self.pool).await?;
        let removed = self.uploads.sweep_orphans(&referenced).await?;
        Ok(removed)
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> SqlitePool {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(app_state: &AppState) -> TokenKeys {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for Uploads {
    fn from_ref(app_state: &AppState) -> Uploads {
        app_state.uploads.clone()
    }
}
