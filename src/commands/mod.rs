use anyhow::Result;
use log::debug;
use std::path::{Path, PathBuf};

use crate::{
    application::{PackOptions, PackUseCase, TargetResolver, WorkspaceSelection},
    package::{ArchiveResult, find_project_root},
    packer::TarballPacker,
    report::{ConsoleReporter, Progress, Reporter, SilentProgress, SpinnerProgress},
    resolver::{DefaultResolver, DirectoryResolver, RegistryResolver},
    runtime::{Runtime, resolve_path},
};

pub mod config;

use config::Config;

/// Everything the `pack` command was asked to do.
#[derive(Debug, Clone, Default)]
pub struct PackRequest {
    /// Targets as typed on the command line
    pub specs: Vec<String>,
    pub selection: WorkspaceSelection,
    pub options: PackOptions,
    /// Suppress notices and the spinner
    pub silent: bool,
    pub prefix: Option<PathBuf>,
    pub registry: Option<String>,
    pub destination: Option<PathBuf>,
}

/// Pack the requested targets, printing one line per tarball on stdout.
#[tracing::instrument(skip(runtime))]
pub async fn pack<R: Runtime>(runtime: R, request: PackRequest) -> Result<Vec<ArchiveResult>> {
    let cwd = runtime.current_dir()?;
    let destination = request
        .destination
        .as_deref()
        .map(|d| resolve_path(&cwd, d))
        .unwrap_or_else(|| cwd.clone());
    let config = Config::new(runtime, request.registry.clone(), destination)?;
    let reporter = ConsoleReporter::stdout();
    run(config, &cwd, &request, &reporter).await
}

#[tracing::instrument(skip(config, reporter))]
pub async fn run<R: Runtime, O: Reporter>(
    config: Config<R>,
    cwd: &Path,
    request: &PackRequest,
    reporter: &O,
) -> Result<Vec<ArchiveResult>> {
    let prefix = match &request.prefix {
        Some(prefix) => resolve_path(cwd, prefix),
        None => find_project_root(&config.runtime, cwd),
    };
    debug!("Using project root {:?}", prefix);

    let specs = TargetResolver::new(&config.runtime, cwd.to_path_buf(), prefix)
        .resolve(&request.specs, &request.selection)?;
    debug!("Resolved {} target(s)", specs.len());

    let resolver = DefaultResolver::new(
        DirectoryResolver::new(&config.runtime),
        RegistryResolver::new(config.http_client.clone(), &config.registry),
    );
    let packer = TarballPacker::new(
        &config.runtime,
        config.http_client.clone(),
        config.destination.clone(),
    );
    let progress: Box<dyn Progress> = if request.silent {
        Box::new(SilentProgress)
    } else {
        Box::new(SpinnerProgress::new(request.options.unicode))
    };

    PackUseCase::new(&resolver, &packer, reporter, progress.as_ref())
        .run(&specs, &request.options)
        .await
        .into_result()
}
