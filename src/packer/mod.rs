//! Archive packer - turns a resolved package into tarball bytes and, unless
//! this is a dry run, writes them to the pack destination.

mod files;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, info};
use std::path::PathBuf;

pub use files::collect_files;

use crate::archive::{TarEntry, build_tarball, inspect_tarball};
use crate::http::HttpClient;
use crate::package::{Manifest, PackOptions, PackSpec};
use crate::runtime::Runtime;

/// What the packer produced for one spec.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedTarball {
    /// Compressed size in bytes
    pub size: u64,
    pub files: Vec<TarEntry>,
    /// Where the tarball was written; `None` on a dry run
    pub written_to: Option<PathBuf>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchivePacker: Send + Sync {
    /// Produce the tarball for `spec`. Must not touch the file system when
    /// `options.dry_run` is set, but must otherwise behave identically.
    async fn pack(
        &self,
        spec: &PackSpec,
        manifest: &Manifest,
        filename: &str,
        options: &PackOptions,
    ) -> Result<PackedTarball>;
}

/// Packs directories from disk and registry packages by downloading their
/// published tarball.
pub struct TarballPacker<'a, R: Runtime> {
    runtime: &'a R,
    http_client: HttpClient,
    destination: PathBuf,
}

impl<'a, R: Runtime> TarballPacker<'a, R> {
    pub fn new(runtime: &'a R, http_client: HttpClient, destination: PathBuf) -> Self {
        Self {
            runtime,
            http_client,
            destination,
        }
    }

    async fn tarball_bytes(&self, spec: &PackSpec, manifest: &Manifest) -> Result<Vec<u8>> {
        match spec {
            PackSpec::Directory(dir) => {
                let files = collect_files(self.runtime, dir, manifest)?;
                debug!("Packing {} file(s) from {}", files.len(), dir.display());
                build_tarball(&files)
            }
            PackSpec::Registry(_) => {
                let dist = manifest.dist.as_ref().ok_or_else(|| {
                    anyhow!("No tarball URL in registry metadata for {}", manifest.id())
                })?;
                info!("Fetching {} from {}", manifest.id(), dist.tarball);
                self.http_client
                    .get_bytes(&dist.tarball)
                    .await
                    .with_context(|| format!("Failed to download tarball for {}", manifest.id()))
            }
        }
    }
}

#[async_trait]
impl<R: Runtime> ArchivePacker for TarballPacker<'_, R> {
    #[tracing::instrument(skip(self, manifest, options))]
    async fn pack(
        &self,
        spec: &PackSpec,
        manifest: &Manifest,
        filename: &str,
        options: &PackOptions,
    ) -> Result<PackedTarball> {
        let bytes = self.tarball_bytes(spec, manifest).await?;
        let files = inspect_tarball(&bytes)?;

        let written_to = if options.dry_run {
            debug!("Dry run, not writing {}", filename);
            None
        } else {
            let path = self.destination.join(filename);
            self.runtime.create_dir_all(&self.destination)?;
            self.runtime.write(&path, &bytes)?;
            info!("Wrote {}", path.display());
            Some(path)
        };

        Ok(PackedTarball {
            size: bytes.len() as u64,
            files,
            written_to,
        })
    }
}
