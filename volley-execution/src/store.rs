//! Saved run results, one JSON file per run

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use volley_core::RunResults;

use crate::error::StoreError;

/// Writes results as `<data_dir>/<id>.json`
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

/// Keep `[A-Za-z0-9_-]`, replace everything else with `_`
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// File id for a result: start time followed by its labels, or the target host
pub fn result_id(results: &RunResults) -> String {
    let suffix = if results.labels.trim().is_empty() {
        url::Url::parse(&results.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    } else {
        results.labels.clone()
    };
    sanitize(&format!(
        "{}_{}",
        results.start_time.format("%Y-%m-%d-%H%M%S"),
        suffix
    ))
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file a result with `id` is saved to
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Save `results` pretty printed, setting its `ID`, and return that id.
    ///
    /// The data directory is created on first use. Existing files are never
    /// replaced: when the id is taken, `_2`, `_3` and so on are appended until
    /// a free one is found.
    pub async fn save(&self, results: &mut RunResults) -> Result<String, StoreError> {
        let base = result_id(results);

        let io_error = |path: &Path, source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let mut attempt = 1u32;
        loop {
            let id = if attempt == 1 {
                base.clone()
            } else {
                format!("{}_{}", base, attempt)
            };
            let path = self.path_for(&id);
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Result id {} already taken", id);
                    attempt += 1;
                    continue;
                }
                Err(e) => return Err(io_error(&path, e)),
            };

            results.id = Some(id.clone());
            let body = serde_json::to_vec_pretty(results)?;
            file.write_all(&body).await.map_err(|e| io_error(&path, e))?;
            file.flush().await.map_err(|e| io_error(&path, e))?;

            info!("Saved run result to {}", path.display());
            return Ok(id);
        }
    }
}
