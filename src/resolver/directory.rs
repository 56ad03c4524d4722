use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::debug;

use super::ManifestResolver;
use crate::package::workspace::PACKAGE_JSON;
use crate::package::{Manifest, PackSpec};
use crate::runtime::Runtime;

/// Reads `package.json` from a directory.
pub struct DirectoryResolver<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> DirectoryResolver<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl<R: Runtime> ManifestResolver for DirectoryResolver<'_, R> {
    #[tracing::instrument(skip(self))]
    async fn manifest(&self, spec: &PackSpec) -> Result<Manifest> {
        let PackSpec::Directory(dir) = spec else {
            bail!("{} is not a directory spec", spec);
        };

        let path = dir.join(PACKAGE_JSON);
        debug!("Reading manifest from {}", path.display());
        let content = self
            .runtime
            .read_to_string(&path)
            .with_context(|| format!("No package.json found in {}", dir.display()))?;

        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}
