//! File-backed artifact cache
//!
//! Provides:
//! - One JSON blob per derivation name under a cache root
//! - Generic get/store operations
//! - `get_or_compute` memoization of derived tables
//!
//! The presence of a blob is the only freshness signal. There is no TTL and
//! no invalidation on input or schema change: an artifact produced from an
//! older input version is served as-is until the caller deletes it.

use crate::errors::{AppError, Result};
use crate::metrics::record_cache;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ARTIFACT_EXTENSION: &str = "json";

/// Artifact cache rooted at a directory
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
}

impl ArtifactCache {
    /// Open a cache, creating the root directory when missing
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| AppError::CacheError {
            message: format!("Failed to create cache root '{}': {}", root.display(), e),
        })?;

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the blob path for a derivation name
    fn path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

        if !valid {
            return Err(AppError::InvalidDerivationName {
                name: name.to_string(),
            });
        }

        Ok(self.root.join(format!("{}.{}", name, ARTIFACT_EXTENSION)))
    }

    /// Check if an artifact exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path(name)?.is_file())
    }

    /// Read an artifact
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name)?;
        if !path.is_file() {
            debug!(artifact = %name, "Cache miss");
            return Ok(None);
        }

        let file = fs::File::open(&path).map_err(|e| AppError::CacheError {
            message: format!("Failed to open artifact '{}': {}", path.display(), e),
        })?;

        let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            AppError::CacheError {
                message: format!("Failed to parse artifact '{}': {}", path.display(), e),
            }
        })?;

        debug!(artifact = %name, "Cache hit");
        Ok(Some(value))
    }

    /// Persist an artifact, replacing any previous blob under the same name
    pub fn store<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path(name)?;

        // The root may have been removed since open()
        fs::create_dir_all(&self.root)?;

        let file = fs::File::create(&path).map_err(|e| AppError::CacheError {
            message: format!("Failed to create artifact '{}': {}", path.display(), e),
        })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;

        debug!(artifact = %name, path = %path.display(), "Artifact stored");
        Ok(())
    }

    /// Delete an artifact
    pub fn delete(&self, name: &str) -> Result<bool> {
        let path = self.path(name)?;
        if !path.is_file() {
            return Ok(false);
        }

        fs::remove_file(&path)?;
        debug!(artifact = %name, "Artifact deleted");
        Ok(true)
    }

    /// Return the stored artifact, or compute, store and return it
    ///
    /// When the artifact exists `compute` is not called at all.
    pub fn get_or_compute<T, F>(&self, name: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        if let Some(cached) = self.get::<T>(name)? {
            record_cache(true, name);
            info!(artifact = %name, "Loaded artifact instead of recomputing");
            return Ok(cached);
        }

        record_cache(false, name);
        let value = compute()?;
        self.store(name, &value)?;

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeMap;

    #[test]
    fn test_get_or_compute_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();
        let calls = Cell::new(0);

        let compute = || {
            calls.set(calls.get() + 1);
            let mut table = BTreeMap::new();
            table.insert(7u64, 0.25f64);
            table.insert(11u64, 1.0 / 3.0);
            Ok(table)
        };

        let first: BTreeMap<u64, f64> = cache.get_or_compute("paper", compute).unwrap();
        let second: BTreeMap<u64, f64> = cache
            .get_or_compute("paper", || {
                calls.set(calls.get() + 1);
                Ok(BTreeMap::new())
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_missing_root_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("pickles");
        let cache = ArtifactCache::open(&root).unwrap();
        assert!(root.is_dir());

        fs::remove_dir_all(&root).unwrap();
        cache.store("author", &vec![1u64, 2, 3]).unwrap();
        assert!(cache.exists("author").unwrap());
    }

    #[test]
    fn test_stale_artifact_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();
        cache.store("venue", &"old".to_string()).unwrap();

        let value: String = cache
            .get_or_compute("venue", || Ok("new".to_string()))
            .unwrap();
        assert_eq!(value, "old");

        assert!(cache.delete("venue").unwrap());
        let value: String = cache
            .get_or_compute("venue", || Ok("new".to_string()))
            .unwrap();
        assert_eq!(value, "new");
    }

    #[test]
    fn test_compute_error_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();

        let result: Result<u32> = cache.get_or_compute("train", || {
            Err(AppError::Internal {
                message: "boom".into(),
            })
        });
        assert!(result.is_err());
        assert!(!cache.exists("train").unwrap());
    }

    #[test]
    fn test_invalid_names() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ArtifactCache::open(dir.path()).unwrap();

        for name in ["", "../escape", "a/b", ".hidden"] {
            assert!(matches!(
                cache.exists(name),
                Err(AppError::InvalidDerivationName { .. })
            ));
        }
        assert!(cache.exists("paper_author.v2").is_ok());
    }
}
