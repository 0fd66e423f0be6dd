pub mod consts;
pub mod errors;
pub mod utils;
pub mod params;
pub mod bits;
pub mod meta;
pub mod filter;
pub mod info;
pub mod single_file;
pub mod split_file;
pub mod config;

pub use config::BloomConfig;
pub use consts::FORMAT_VERSION;
pub use errors::{BloomError, Result};
pub use filter::{Added, Bloom};
pub use info::BloomInfo;
pub use params::BloomParams;
pub use split_file::split_paths;

/// Build-time version of this crate.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
