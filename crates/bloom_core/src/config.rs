use crate::errors::{BloomError, Result};
use crate::filter::Bloom;
use crate::params::BloomParams;
use crate::utils::{fsync_dir, parent_dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Filter sizing as stored in a JSON config file:
///
/// ```json
/// { "entries": 1000000, "error_rate": 0.001 }
/// ```
///
/// Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub entries: u64,
    pub error_rate: f64,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self { entries: 1_000_000, error_rate: 0.001 }
    }
}

impl BloomConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&s)?)
    }

    /// Writes through a temp file in the same directory and renames it over `path`.
    pub fn save_atomic(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let write_err = |source: io::Error| BloomError::Write { path: path.to_path_buf(), source };
        let mut tmp = tempfile::Builder::new()
            .prefix(".bloom_")
            .tempfile_in(parent_dir(path))
            .map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path)?;
        let _ = fsync_dir(path);
        Ok(())
    }

    pub fn params(&self) -> Result<BloomParams> {
        BloomParams::derive(self.entries, self.error_rate)
    }

    pub fn build(&self) -> Result<Bloom> {
        Bloom::new(self.entries, self.error_rate)
    }

    /// Sizing only, no storage; see [`Bloom::dummy`].
    pub fn dry_run(&self) -> Result<Bloom> {
        Bloom::dummy(self.entries, self.error_rate)
    }
}
