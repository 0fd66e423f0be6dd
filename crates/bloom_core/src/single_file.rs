//! Single-file filter format (LE)
//!
//!   magic[9]  = "libbloom2"
//!   size[2]   = metadata record size (44)
//!   meta[44]  = see `meta.rs`
//!   bits[..]  = raw bit buffer, exactly `bytes` long
//!
//! Load checks each step in order and fails with its own error code
//! (`BloomError::code`). Save goes through a temp file next to the target and
//! is published with an atomic rename.

use crate::bits::BitBuf;
use crate::consts::{MAGIC, META_SIZE, META_SIZE_FIELD, SINGLE_FILE_HEADER};
use crate::errors::{BloomError, Result};
use crate::filter::Bloom;
use crate::meta::Meta;
use crate::utils::{fsync_dir, open_read, parent_dir, read_exact_or, read_failed, write_u16};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

impl Bloom {
    fn write_image<W: Write>(&self, bits: &BitBuf, w: &mut W) -> io::Result<()> {
        w.write_all(MAGIC)?;
        write_u16(w, META_SIZE_FIELD)?;
        self.meta().write_to(w)?;
        bits.write_to(w)
    }

    /// Writes the single-file image to any sink.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        let bits = self.buffer()?;
        self.write_image(bits, w)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let bits = self.buffer()?;
        let mut out = Vec::with_capacity(SINGLE_FILE_HEADER + bits.len());
        self.write_image(bits, &mut out)?;
        Ok(out)
    }

    /// Reads a single-file image from any source.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        Self::read_image(r, None)
    }

    /// `available`, when known, is the total source length; a header claiming
    /// more bytes than that fails before the buffer is allocated.
    fn read_image<R: Read>(r: &mut R, available: Option<u64>) -> Result<Self> {
        let mut magic = [0u8; MAGIC.len()];
        read_exact_or(r, &mut magic, BloomError::MagicShort)?;
        if &magic != MAGIC {
            return Err(BloomError::BadMagic);
        }

        let mut size = [0u8; 2];
        read_exact_or(r, &mut size, BloomError::SizeFieldShort)?;
        let size = u16::from_le_bytes(size);
        if size != META_SIZE_FIELD {
            return Err(BloomError::SizeMismatch { found: size, expected: META_SIZE_FIELD });
        }

        let mut raw = [0u8; META_SIZE];
        read_exact_or(r, &mut raw, BloomError::MetadataShort)?;
        let meta = Meta::decode(&raw);
        meta.check_version()?;
        meta.check_geometry()?;

        let expected = meta.params.bytes;
        if let Some(len) = available {
            if len.saturating_sub(SINGLE_FILE_HEADER as u64) < expected {
                return Err(BloomError::BitsShort { expected });
            }
        }
        let mut bits = BitBuf::zeroed(expected)?;
        bits.fill_from(r).map_err(|e| read_failed(e, BloomError::BitsShort { expected }))?;
        Ok(Self::from_parts(meta, bits))
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        Self::read_from(&mut bytes)
    }

    /// Saves to one file, replacing any existing file atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(BloomError::EmptyPath);
        }
        let bits = self.buffer()?;
        let write_err = |source: io::Error| BloomError::Write { path: path.to_path_buf(), source };

        let mut tmp = tempfile::Builder::new()
            .prefix(".bloom_")
            .tempfile_in(parent_dir(path))
            .map_err(write_err)?;
        {
            let mut w = BufWriter::new(tmp.as_file_mut());
            self.write_image(bits, &mut w).map_err(write_err)?;
            w.flush().map_err(write_err)?;
        }
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path)?;
        let _ = fsync_dir(path);
        debug!(path = %path.display(), bytes = self.bytes(), "bloom filter saved");
        Ok(())
    }

    /// Loads a filter saved with [`Bloom::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let res = if path.as_os_str().is_empty() {
            Err(BloomError::EmptyPath)
        } else {
            open_read(path).and_then(|f| {
                let len = f.metadata().ok().map(|m| m.len());
                Self::read_image(&mut BufReader::new(f), len)
            })
        };
        match res {
            Ok(b) => {
                debug!(path = %path.display(), bytes = b.bytes(), "bloom filter loaded");
                Ok(b)
            }
            Err(e) => {
                warn!(path = %path.display(), code = e.code(), error = %e, "bloom filter load failed");
                Err(e)
            }
        }
    }

    /// Loads into an existing filter. On failure `self` is left empty and unready.
    pub fn load_into(&mut self, path: impl AsRef<Path>) -> Result<()> {
        *self = Self::default();
        *self = Self::load(path)?;
        Ok(())
    }
}
