use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BloomError {
    #[error("Invalid parameters: entries={entries} error={error} (need entries >= 1000, 0 < error < 1)")]
    InvalidParameters { entries: u64, error: f64 },

    #[error("Filter not initialized")]
    NotReady,

    #[error("Cannot allocate {bytes} bytes for the bit buffer")]
    Alloc { bytes: u64 },

    #[error("Empty file name")]
    EmptyPath,

    #[error("File not found: {}", .path.display())]
    MissingFile { path: PathBuf },

    #[error("Open {}: {source}", .path.display())]
    Open { path: PathBuf, #[source] source: std::io::Error },

    #[error("Write {}: {source}", .path.display())]
    Write { path: PathBuf, #[source] source: std::io::Error },

    #[error("Short magic read")]
    MagicShort,

    #[error("Bad magic")]
    BadMagic,

    #[error("Short size field read")]
    SizeFieldShort,

    #[error("Metadata size {found} does not match expected {expected}")]
    SizeMismatch { found: u16, expected: u16 },

    #[error("Short metadata read")]
    MetadataShort,

    #[error("Unsupported major version {found} (expected {expected})")]
    MajorVersion { found: u8, expected: u8 },

    #[error("Short bit buffer read (expected {expected} bytes)")]
    BitsShort { expected: u64 },

    #[error("Corrupt metadata: {0}")]
    Corrupt(String),

    #[error("Config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persist: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl BloomError {
    /// Stable numeric code of a load failure, in validation order.
    /// Code 2 (missing destination) is reserved; a `&mut Bloom` cannot be null.
    pub fn code(&self) -> i32 {
        match self {
            BloomError::EmptyPath => 1,
            BloomError::MissingFile { .. } | BloomError::Open { .. } => 3,
            BloomError::MagicShort => 4,
            BloomError::BadMagic => 5,
            BloomError::SizeFieldShort => 6,
            BloomError::SizeMismatch { .. } => 7,
            BloomError::MetadataShort => 8,
            BloomError::MajorVersion { .. } => 9,
            BloomError::Alloc { .. } => 10,
            BloomError::BitsShort { .. } => 11,
            BloomError::Corrupt(_) => 12,
            BloomError::InvalidParameters { .. } => 20,
            BloomError::NotReady => 21,
            BloomError::Write { .. } | BloomError::Persist(_) => 30,
            BloomError::Io(_) => 31,
            BloomError::Config(_) => 40,
        }
    }

    /// True for failures that say the stored data cannot be trusted
    /// (as opposed to plain I/O trouble).
    pub fn is_incompatible(&self) -> bool {
        matches!(
            self,
            BloomError::BadMagic
                | BloomError::SizeMismatch { .. }
                | BloomError::MajorVersion { .. }
                | BloomError::Corrupt(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BloomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_codes_are_distinct() {
        let errs = [
            BloomError::EmptyPath,
            BloomError::MissingFile { path: PathBuf::from("x") },
            BloomError::MagicShort,
            BloomError::BadMagic,
            BloomError::SizeFieldShort,
            BloomError::SizeMismatch { found: 1, expected: 44 },
            BloomError::MetadataShort,
            BloomError::MajorVersion { found: 1, expected: 2 },
            BloomError::Alloc { bytes: 1 },
            BloomError::BitsShort { expected: 8 },
            BloomError::Corrupt("bits".into()),
        ];
        let mut codes: Vec<i32> = errs.iter().map(|e| e.code()).collect();
        assert!(codes.iter().all(|&c| c != 0));
        codes.dedup();
        assert_eq!(codes, vec![1, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn incompatibility_is_separate_from_io() {
        assert!(BloomError::BadMagic.is_incompatible());
        assert!(BloomError::MajorVersion { found: 3, expected: 2 }.is_incompatible());
        assert!(!BloomError::MagicShort.is_incompatible());
        assert!(!BloomError::MissingFile { path: PathBuf::from("x") }.is_incompatible());
    }
}
