mod filename;
mod manifest;
mod spec;
pub mod workspace;

use serde::Serialize;

pub use filename::derive_filename;
pub use manifest::{Dist, Manifest};
pub use spec::{PackSpec, RegistrySpec};
pub use workspace::{Workspace, discover_workspaces, filter_workspaces, find_project_root};

use crate::archive::TarEntry;

/// Settings shared by every spec of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackOptions {
    /// Compute everything but do not write the tarball
    pub dry_run: bool,
    /// Report one JSON object per tarball instead of its filename
    pub json: bool,
    /// Allow non-ASCII symbols in notices and the spinner
    pub unicode: bool,
}

/// Outcome of packing one spec. `filename` is the load-bearing field; the rest
/// describes the tarball for notices and `--json` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveResult {
    pub id: String,
    pub name: String,
    pub version: String,
    pub filename: String,
    /// Compressed tarball size in bytes
    pub size: u64,
    pub unpacked_size: u64,
    pub entry_count: usize,
    pub files: Vec<TarEntry>,
}

impl ArchiveResult {
    pub fn new(manifest: &Manifest, filename: String, size: u64, files: Vec<TarEntry>) -> Self {
        Self {
            id: manifest.id(),
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            filename,
            size,
            unpacked_size: files.iter().map(|f| f.size).sum(),
            entry_count: files.len(),
            files,
        }
    }
}
