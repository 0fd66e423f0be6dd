//! Two-file filter format: `<base>.meta` holds the 44-byte metadata record,
//! `<base>.bits` holds the raw bit buffer and nothing else.
//!
//! There is no magic tag, so a `.bits` file whose length differs from the
//! record's byte count is the only sign of a mismatched pair.

use crate::bits::BitBuf;
use crate::consts::{BITS_EXT, META_EXT, META_SIZE};
use crate::errors::{BloomError, Result};
use crate::filter::Bloom;
use crate::meta::Meta;
use crate::utils::{fsync_dir, open_read, parent_dir, read_exact_or, read_failed};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, warn};

/// `<base>.<ext>`, appended rather than replacing any existing extension.
pub fn split_paths(base: &Path) -> (PathBuf, PathBuf) {
    let with = |ext: &str| {
        let mut s: OsString = base.as_os_str().to_owned();
        s.push(".");
        s.push(ext);
        PathBuf::from(s)
    };
    (with(META_EXT), with(BITS_EXT))
}

/// Writes and syncs a temp file next to `path` without publishing it.
fn stage<F>(path: &Path, fill: F) -> Result<NamedTempFile>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> io::Result<()>,
{
    let write_err = |source: io::Error| BloomError::Write { path: path.to_path_buf(), source };
    let mut tmp = tempfile::Builder::new()
        .prefix(".bloom_")
        .tempfile_in(parent_dir(path))
        .map_err(write_err)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        fill(&mut w).map_err(write_err)?;
        w.flush().map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    Ok(tmp)
}

/// Moves an existing `path` to a temp name in the same directory so it can be
/// put back. The returned path is deleted on drop.
fn set_aside(path: &Path) -> Result<Option<TempPath>> {
    let write_err = |source: io::Error| BloomError::Write { path: path.to_path_buf(), source };
    let hold = tempfile::Builder::new()
        .prefix(".bloom_old_")
        .tempfile_in(parent_dir(path))
        .map_err(write_err)?
        .into_temp_path();
    match fs::rename(path, &hold) {
        Ok(()) => Ok(Some(hold)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(write_err(e)),
    }
}

fn put_back(bits_path: &Path, old: Option<TempPath>) {
    let res = match old {
        Some(old) => old.persist(bits_path).map_err(|e| e.error),
        None => fs::remove_file(bits_path),
    };
    if let Err(e) = res {
        warn!(path = %bits_path.display(), error = %e, "could not restore bit buffer file");
    }
}

impl Bloom {
    /// Saves as `<base>.meta` + `<base>.bits`.
    ///
    /// Both files are fully written and synced before either is renamed into
    /// place. If publishing `.meta` fails, the previous `.bits` is restored.
    /// A crash between the two renames can still leave a new `.bits` next to
    /// the old `.meta`.
    pub fn save_split(&self, base: impl AsRef<Path>) -> Result<()> {
        let base = base.as_ref();
        if base.as_os_str().is_empty() {
            return Err(BloomError::EmptyPath);
        }
        let bits = self.buffer()?;
        let (meta_path, bits_path) = split_paths(base);

        let bits_tmp = stage(&bits_path, |w| bits.write_to(w))?;
        let meta_tmp = stage(&meta_path, |w| self.meta().write_to(w))?;

        let old = set_aside(&bits_path)?;
        if let Err(e) = bits_tmp.persist(&bits_path) {
            put_back(&bits_path, old);
            return Err(BloomError::Write { path: bits_path, source: e.error });
        }
        if let Err(e) = meta_tmp.persist(&meta_path) {
            put_back(&bits_path, old);
            return Err(BloomError::Write { path: meta_path, source: e.error });
        }
        drop(old);
        let _ = fsync_dir(&meta_path);
        debug!(base = %base.display(), bytes = self.bytes(), "bloom filter saved (split)");
        Ok(())
    }

    /// Loads a filter saved with [`Bloom::save_split`].
    pub fn load_split(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        match Self::read_split(base) {
            Ok(b) => {
                debug!(base = %base.display(), bytes = b.bytes(), "bloom filter loaded (split)");
                Ok(b)
            }
            Err(e) => {
                warn!(base = %base.display(), code = e.code(), error = %e, "bloom filter load failed (split)");
                Err(e)
            }
        }
    }

    /// Split-form counterpart of [`Bloom::load_into`].
    pub fn load_split_into(&mut self, base: impl AsRef<Path>) -> Result<()> {
        *self = Self::default();
        *self = Self::load_split(base)?;
        Ok(())
    }

    fn read_split(base: &Path) -> Result<Self> {
        if base.as_os_str().is_empty() {
            return Err(BloomError::EmptyPath);
        }
        let (meta_path, bits_path) = split_paths(base);
        let meta_file = open_read(&meta_path)?;
        let bits_file = open_read(&bits_path)?;

        let mut raw = [0u8; META_SIZE];
        read_exact_or(&mut BufReader::new(meta_file), &mut raw, BloomError::MetadataShort)?;
        let meta = Meta::decode(&raw);
        meta.check_version()?;
        meta.check_geometry()?;

        let expected = meta.params.bytes;
        let on_disk = bits_file.metadata()?.len();
        if on_disk < expected {
            return Err(BloomError::BitsShort { expected });
        }
        if on_disk > expected {
            return Err(BloomError::Corrupt(format!(
                "{} holds {on_disk} bytes, metadata expects {expected}",
                bits_path.display()
            )));
        }

        let mut bits = BitBuf::zeroed(expected)?;
        bits.fill_from(&mut BufReader::new(bits_file))
            .map_err(|e| read_failed(e, BloomError::BitsShort { expected }))?;
        Ok(Self::from_parts(meta, bits))
    }
}
