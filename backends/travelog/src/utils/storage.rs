//! Uploaded media on the local filesystem.
//!
//! Files live flat in one directory and are served verbatim under
//! [`UPLOAD_ROUTE`]. Rows store the relative URL; the public base URL is
//! prefixed when a response is built.

use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const UPLOAD_ROUTE: &str = "/uploads";

const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub filename: String,
    pub url: String,
    pub mimetype: String,
}

#[derive(Debug, Clone)]
pub struct Uploads {
    dir: PathBuf,
    base_url: String,
}

impl Uploads {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    pub async fn save(&self, original_name: &str, mimetype: &str, bytes: &[u8]) -> io::Result<Photo> {
        let filename = format!(
            "{}_{}",
            Uuid::new_v4().simple(),
            sanitize_filename(original_name)
        );
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        tracing::debug!(%filename, size = bytes.len(), "stored upload");

        Ok(Photo {
            url: relative_url(&filename),
            filename,
            mimetype: mimetype.to_string(),
        })
    }

    pub fn absolute_url(&self, relative: &str) -> String {
        format!("{}{}", self.base_url, relative)
    }

    pub fn resolve(&self, photo: &Photo) -> Photo {
        Photo {
            url: self.absolute_url(&photo.url),
            ..photo.clone()
        }
    }

    // Best effort: a file that is already gone is fine, anything else is
    // logged and left for the startup sweep.
    pub async fn remove(&self, filename: &str) {
        if !is_plain_filename(filename) {
            tracing::warn!(%filename, "refusing to remove upload outside the upload dir");
            return;
        }

        match tokio::fs::remove_file(self.dir.join(filename)).await {
            Ok(()) => tracing::debug!(%filename, "removed upload"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => tracing::warn!(%filename, error = %err, "failed to remove upload"),
        }
    }

    pub async fn remove_all(&self, photos: &[Photo]) {
        for photo in photos {
            self.remove(&photo.filename).await;
        }
    }

    /// Deletes every entry in the upload dir whose name is not in `referenced`.
    /// Entries that can't be removed are logged and left in place. Returns how
    /// many files were removed.
    pub async fn sweep_orphans(&self, referenced: &HashSet<String>) -> io::Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            if referenced.contains(&name) {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    tracing::info!(filename = %name, "swept orphaned upload");
                    removed += 1;
                }
                Err(err) => {
                    tracing::warn!(filename = %name, error = %err, "failed to sweep upload")
                }
            }
        }

        Ok(removed)
    }
}

pub fn relative_url(filename: &str) -> String {
    format!("{UPLOAD_ROUTE}/{filename}")
}

pub fn filename_from_url(url: &str) -> Option<&str> {
    url.strip_prefix(UPLOAD_ROUTE)?
        .strip_prefix('/')
        .filter(|name| is_plain_filename(name))
}

pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .take(MAX_NAME_LEN)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
