use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;

use super::ManifestResolver;
use crate::http::HttpClient;
use crate::package::{Manifest, PackSpec, RegistrySpec};

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

const LATEST_TAG: &str = "latest";

/// The registry document listing every published version of a package.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Packument {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "dist-tags")]
    pub dist_tags: HashMap<String, String>,
    /// Kept as raw JSON; only the selected version is parsed
    #[serde(default)]
    pub versions: HashMap<String, serde_json::Value>,
}

impl Packument {
    /// Pick the version for `selector`: an exact version, a dist-tag, or
    /// `latest` when no selector is given.
    pub fn select(&self, spec: &RegistrySpec) -> Result<Manifest> {
        let selector = spec.selector.as_deref().unwrap_or(LATEST_TAG);

        let version = if self.versions.contains_key(selector) {
            selector
        } else {
            self.dist_tags
                .get(selector)
                .map(String::as_str)
                .filter(|v| self.versions.contains_key(*v))
                .ok_or_else(|| {
                    anyhow!("No matching version found for {}@{}", spec.name, selector)
                })?
        };

        let document = self.versions.get(version).cloned().unwrap_or_default();
        serde_json::from_value(document)
            .with_context(|| format!("Invalid metadata for {}@{}", spec.name, version))
    }
}

/// Fetches packuments from an npm-compatible registry.
pub struct RegistryResolver {
    http_client: HttpClient,
    registry: String,
}

impl RegistryResolver {
    pub fn new(http_client: HttpClient, registry: &str) -> Self {
        Self {
            http_client,
            registry: registry.trim_end_matches('/').to_string(),
        }
    }

    /// Scoped names keep the `@` but escape the `/`.
    pub fn packument_url(&self, name: &str) -> String {
        format!("{}/{}", self.registry, name.replacen('/', "%2f", 1))
    }
}

#[async_trait]
impl ManifestResolver for RegistryResolver {
    #[tracing::instrument(skip(self))]
    async fn manifest(&self, spec: &PackSpec) -> Result<Manifest> {
        let PackSpec::Registry(registry_spec) = spec else {
            bail!("{} is not a registry spec", spec);
        };

        let url = self.packument_url(&registry_spec.name);
        debug!("Fetching packument for {} from {}", registry_spec.name, url);

        let packument: Packument = self
            .http_client
            .get_json(&url)
            .await
            .with_context(|| format!("Failed to fetch package metadata for {}", registry_spec))?;

        packument.select(registry_spec)
    }
}
