mod auth;
pub use auth::*;
mod user;
pub use user::*;
mod follow;
pub use follow::*;
mod city;
pub use city::*;
mod trip;
pub use trip::*;
mod like;
pub use like::*;
mod comment;
pub use comment::*;

use std::{collections::HashSet, str::FromStr};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Executor, SqlitePool,
};

use crate::utils::storage::filename_from_url;

const MAX_CONNECTIONS: u32 = 5;

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to an in-memory database opens a fresh one, so keep
    // exactly one alive for the lifetime of the pool.
    if database_url.contains(":memory:") || database_url.contains("mode=memory") {
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
}

pub async fn prepare_db(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(include_str!("sql/schema.sql")).await?;
    Ok(())
}

/// Every upload filename some row still points at.
pub async fn referenced_uploads(pool: &SqlitePool) -> Result<HashSet<String>, sqlx::Error> {
    let mut referenced: HashSet<String> = all_trip_photos(pool)
        .await?
        .into_iter()
        .map(|photo| photo.filename)
        .collect();

    for url in all_avatar_urls(pool).await? {
        if let Some(filename) = filename_from_url(&url) {
            referenced.insert(filename.to_string());
        }
    }

    Ok(referenced)
}
