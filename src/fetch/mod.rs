// src/fetch/mod.rs

use std::path::Path;

use crate::error::Result;

pub mod zips;

pub use zips::HttpFetcher;

/// Retrieves a remote archive onto local disk.
///
/// Implementations are all-or-nothing: on success `dest` holds the full
/// content, on failure `dest` is left untouched.
pub trait Fetcher {
    /// Download `uri` into `dest`, returning the number of bytes written.
    fn fetch(&self, uri: &str, dest: &Path) -> Result<u64>;
}
