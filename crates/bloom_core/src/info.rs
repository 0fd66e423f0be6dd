use crate::meta::Meta;
use serde::Serialize;
use std::fmt;

/// Read-only snapshot of a filter's parameters, for logs and diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BloomInfo {
    pub ready: bool,
    pub major: u8,
    pub minor: u8,
    pub entries: u64,
    pub error: f64,
    pub bits: u64,
    pub bits_per_element: f64,
    pub bytes: u64,
    pub kib: u64,
    pub mib: u64,
    pub hashes: u8,
}

impl BloomInfo {
    pub(crate) fn from_meta(m: &Meta) -> Self {
        let p = &m.params;
        Self {
            ready: m.ready,
            major: m.major,
            minor: m.minor,
            entries: p.entries,
            error: p.error,
            bits: p.bits,
            bits_per_element: p.bpe,
            bytes: p.bytes,
            kib: p.bytes / 1024,
            mib: p.bytes / 1024 / 1024,
            hashes: p.hashes,
        }
    }
}

impl fmt::Display for BloomInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bloom")?;
        if !self.ready {
            writeln!(f, " *** NOT READY ***")?;
        }
        writeln!(f, " ->version = {}.{}", self.major, self.minor)?;
        writeln!(f, " ->entries = {}", self.entries)?;
        writeln!(f, " ->error = {:.6}", self.error)?;
        writeln!(f, " ->bits = {}", self.bits)?;
        writeln!(f, " ->bits per elem = {:.6}", self.bits_per_element)?;
        writeln!(f, " ->bytes = {}", self.bytes)?;
        writeln!(f, " ({} KB, {} MB)", self.kib, self.mib)?;
        write!(f, " ->hash functions = {}", self.hashes)
    }
}
