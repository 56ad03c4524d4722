//! Gzipped tarball creation and inspection.
//!
//! Every entry lives under a single top-level `package/` directory, the
//! layout registries expect.

mod tarball;

use serde::Serialize;

pub use tarball::{build_tarball, inspect_tarball};

/// Top-level directory inside every tarball we create.
pub const PACKAGE_PREFIX: &str = "package";

/// 1985-10-26T08:15:00Z. Fixed so identical inputs give identical bytes.
pub const FIXED_MTIME: u64 = 499_162_500;

/// One file to put in a tarball.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    /// Path relative to the package root, `/`-separated
    pub path: String,
    pub contents: Vec<u8>,
    pub mode: u32,
}

/// One file found in a tarball, path relative to the package root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TarEntry {
    pub path: String,
    pub size: u64,
    pub mode: u32,
}

/// Collapse permission bits to 0o755 when any execute bit is set, else 0o644.
pub fn normalize_mode(mode: u32) -> u32 {
    if mode & 0o111 != 0 { 0o755 } else { 0o644 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mode() {
        assert_eq!(normalize_mode(0o600), 0o644);
        assert_eq!(normalize_mode(0o664), 0o644);
        assert_eq!(normalize_mode(0o700), 0o755);
        assert_eq!(normalize_mode(0o744), 0o755);
    }
}
