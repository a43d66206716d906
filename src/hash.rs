//! Stable route tokens for shared directories.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Fixed base segment under which every shared directory is mounted.
pub const FOLDER_ROUTE_BASE: &str = "/folder";

/// Digest an absolute path into a short, URL-safe route token.
///
/// Deterministic across runs on the same input; collision resistance only
/// needs to hold across the handful of directories one process shares.
pub fn route_hash(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_os_str().as_encoded_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..16])
}

/// The full route prefix for a directory, e.g. `/folder/<hash>`.
pub fn route_prefix(path: &Path) -> String {
    format!("{}/{}", FOLDER_ROUTE_BASE, route_hash(path))
}
