use anyhow::{Context, Result};
use flate2::Compression;
use flate2::GzBuilder;
use flate2::read::GzDecoder;
use std::path::Component;
use tar::{Archive, Builder, EntryType, Header, HeaderMode};

use super::{FIXED_MTIME, PACKAGE_PREFIX, SourceFile, TarEntry};
use crate::runtime::to_slash_path;

/// Build a gzipped tarball in memory. Entries are written in the given order
/// under `package/`, with a fixed mtime and no owner information.
#[tracing::instrument(skip(files), fields(count = files.len()))]
pub fn build_tarball(files: &[SourceFile]) -> Result<Vec<u8>> {
    let encoder = GzBuilder::new()
        .mtime(0)
        .write(Vec::new(), Compression::best());
    let mut builder = Builder::new(encoder);
    builder.mode(HeaderMode::Deterministic);

    for file in files {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(file.contents.len() as u64);
        header.set_mode(file.mode);
        header.set_mtime(FIXED_MTIME);

        let entry_path = format!("{}/{}", PACKAGE_PREFIX, file.path);
        builder
            .append_data(&mut header, &entry_path, file.contents.as_slice())
            .with_context(|| format!("Failed to add {} to tarball", file.path))?;
    }

    let encoder = builder.into_inner().context("Failed to finish tarball")?;
    encoder.finish().context("Failed to compress tarball")
}

/// List the regular files of a gzipped tarball, with the top-level directory
/// stripped from each path.
#[tracing::instrument(skip(bytes), fields(size = bytes.len()))]
pub fn inspect_tarball(bytes: &[u8]) -> Result<Vec<TarEntry>> {
    let mut archive = Archive::new(GzDecoder::new(bytes));
    let mut entries = Vec::new();

    for entry in archive.entries().context("Failed to read tarball")? {
        let entry = entry.context("Failed to read tarball entry")?;
        let header = entry.header();
        if !header.entry_type().is_file() {
            continue;
        }

        let path = entry.path().context("Invalid path in tarball")?;
        let relative: std::path::PathBuf = path
            .components()
            .skip_while(|c| !matches!(c, Component::Normal(_)))
            .skip(1)
            .collect();

        entries.push(TarEntry {
            path: to_slash_path(&relative),
            size: header.size().context("Invalid size in tarball entry")?,
            mode: header.mode().context("Invalid mode in tarball entry")?,
        });
    }

    Ok(entries)
}
