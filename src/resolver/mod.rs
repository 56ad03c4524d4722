//! Manifest resolution - turns a pack spec into package metadata.
//!
//! [`DefaultResolver`] dispatches to the directory or registry resolver based
//! on the spec kind.

mod directory;
mod registry;

use anyhow::Result;
use async_trait::async_trait;

pub use directory::DirectoryResolver;
pub use registry::{DEFAULT_REGISTRY, Packument, RegistryResolver};

use crate::package::{Manifest, PackSpec};
use crate::runtime::Runtime;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    /// Resolve the manifest for `spec`. The manifest is returned as found;
    /// validation is the caller's job.
    async fn manifest(&self, spec: &PackSpec) -> Result<Manifest>;
}

/// Resolver selecting the right source for each spec kind.
pub struct DefaultResolver<'a, R: Runtime> {
    directory: DirectoryResolver<'a, R>,
    registry: RegistryResolver,
}

impl<'a, R: Runtime> DefaultResolver<'a, R> {
    pub fn new(directory: DirectoryResolver<'a, R>, registry: RegistryResolver) -> Self {
        Self {
            directory,
            registry,
        }
    }
}

#[async_trait]
impl<R: Runtime> ManifestResolver for DefaultResolver<'_, R> {
    #[tracing::instrument(skip(self))]
    async fn manifest(&self, spec: &PackSpec) -> Result<Manifest> {
        match spec {
            PackSpec::Directory(_) => self.directory.manifest(spec).await,
            PackSpec::Registry(_) => self.registry.manifest(spec).await,
        }
    }
}
