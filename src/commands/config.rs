use anyhow::Result;
use log::debug;
use reqwest::Client;

use std::path::PathBuf;

use crate::{http::HttpClient, resolver::DEFAULT_REGISTRY, runtime::Runtime};

pub struct Config<R: Runtime> {
    pub runtime: R,
    pub http_client: HttpClient,
    pub registry: String,
    /// Directory tarballs are written to
    pub destination: PathBuf,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, registry: Option<String>, destination: PathBuf) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("npack-cli/", env!("NPACK_VERSION")))
            .build()?;

        let registry = registry.unwrap_or_else(|| DEFAULT_REGISTRY.to_string());
        debug!("Using registry {} and destination {:?}", registry, destination);

        Ok(Self {
            runtime,
            http_client: HttpClient::new(client),
            registry,
            destination,
        })
    }
}
