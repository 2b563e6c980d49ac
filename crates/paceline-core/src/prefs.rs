//! Local key-value preferences.
//!
//! A flat string map persisted as JSON at `<base>/prefs.json`. Meant for
//! small best-effort flags (e.g. the cached session flag): a missing file is
//! an empty map, and callers decide whether a failed write matters.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// Local key-value persistence consumed by the session runtime.
pub trait KvStore: Send + Sync + 'static {
    /// Returns the stored value for `key`, if any.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Preferences file structure.
/// Maps preference keys to their string values.
#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(flatten)]
    entries: HashMap<String, String>,
}

/// File-backed preferences store.
#[derive(Debug, Clone)]
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    /// Creates a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default `<base>/prefs.json` location.
    pub fn open_default() -> Self {
        Self::new(paths::prefs_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the preferences map. A missing file is an empty map.
    fn load_file(&self) -> Result<PrefsFile> {
        if !self.path.exists() {
            return Ok(PrefsFile::default());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences from {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse preferences from {}", self.path.display()))
    }

    /// Writes the preferences map atomically (temp file + rename).
    fn save_file(&self, file: &PrefsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents =
            serde_json::to_string_pretty(file).context("Failed to serialize preferences")?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write preferences to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}

impl KvStore for PrefsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_file()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut file = self.load_file()?;
        file.entries.insert(key.to_string(), value.to_string());
        self.save_file(&file)
    }
}
