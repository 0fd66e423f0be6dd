// crates/bloom_core/src/consts.rs

/// Magic tag at the head of a single-file filter.
pub const MAGIC: &[u8; 9] = b"libbloom2";

pub const VERSION_MAJOR: u8 = 2;
pub const VERSION_MINOR: u8 = 1;
pub const FORMAT_VERSION: &str = "2.1";

/// Seed of the first XXH64 round; its output seeds the second.
pub const HASH_SEED: u64 = 0x59f2815b16f81798;

pub const LN_2: f64 = 0.693147180559945;
pub const LN_2_SQUARED: f64 = 0.480453013918201;

pub const MIN_ENTRIES: u64 = 1000;

/// Encoded size of the metadata record, see `meta.rs`.
pub const META_SIZE: usize = 44;
pub const META_SIZE_FIELD: u16 = META_SIZE as u16;

/// Extensions of the two-file form.
pub const META_EXT: &str = "meta";
pub const BITS_EXT: &str = "bits";

pub const SINGLE_FILE_HEADER: usize = MAGIC.len() + 2 + META_SIZE;

const _: () = { assert!(META_SIZE == 8 * 5 + 4); };
