// Optional debug copies of every variant generated for a request.

use super::{
    error::PersistError,
    preprocess::{ImageVariant, VariantSet},
};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writes the five variants of each request into a directory.
#[derive(Debug, Clone)]
pub struct DebugPersister {
    dir: PathBuf,
}

impl DebugPersister {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Best-effort persistence. Failures are logged and dropped.
    pub fn persist(&self, variants: &VariantSet) {
        match self.try_persist(variants, Local::now()) {
            Ok(paths) => debug!(
                "Saved {} debug image(s) to {}",
                paths.len(),
                self.dir.display()
            ),
            Err(e) => warn!("Debug image persistence failed: {}", e),
        }
    }

    /// Writes every variant, stopping at the first failure.
    pub fn try_persist(
        &self,
        variants: &VariantSet,
        now: DateTime<Local>,
    ) -> Result<Vec<PathBuf>, PersistError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| PersistError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let timestamp = now.format("%Y%m%d_%H%M%S_%6f").to_string();
        let mut written = Vec::with_capacity(ImageVariant::ALL.len());
        for (index, variant) in ImageVariant::ALL.into_iter().enumerate() {
            let path = self.dir.join(debug_file_name(&timestamp, index + 1, variant));
            variants
                .save(variant, &path)
                .map_err(|source| PersistError::Write {
                    path: path.clone(),
                    source,
                })?;
            written.push(path);
        }
        Ok(written)
    }
}

fn debug_file_name(timestamp: &str, index: usize, variant: ImageVariant) -> String {
    format!("scan_{}_{}_{}.png", timestamp, index, variant.name())
}
