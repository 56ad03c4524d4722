//! Pack use case - packs each target in order and reports it.

use anyhow::{Error, Result};
use log::debug;

use crate::error::PackError;
use crate::package::{ArchiveResult, PackOptions, PackSpec, derive_filename};
use crate::packer::ArchivePacker;
use crate::report::{Progress, Reporter, log_tarball};
use crate::resolver::ManifestResolver;

/// Outcome of a whole run. `results` holds every tarball packed before the
/// run stopped; `error` is the failure that stopped it, if any.
#[derive(Debug)]
pub struct PackRun {
    pub results: Vec<ArchiveResult>,
    pub error: Option<Error>,
}

impl PackRun {
    pub fn into_result(self) -> Result<Vec<ArchiveResult>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.results),
        }
    }
}

/// Sequential pack orchestrator over the resolver, packer and reporter seams.
pub struct PackUseCase<'a, M: ManifestResolver, P: ArchivePacker, O: Reporter> {
    resolver: &'a M,
    packer: &'a P,
    reporter: &'a O,
    progress: &'a dyn Progress,
}

impl<'a, M: ManifestResolver, P: ArchivePacker, O: Reporter> PackUseCase<'a, M, P, O> {
    pub fn new(resolver: &'a M, packer: &'a P, reporter: &'a O, progress: &'a dyn Progress) -> Self {
        Self {
            resolver,
            packer,
            reporter,
            progress,
        }
    }

    /// Pack `specs` one after the other. Stops at the first failure; results
    /// already reported stay reported.
    #[tracing::instrument(skip(self, specs))]
    pub async fn run(&self, specs: &[PackSpec], options: &PackOptions) -> PackRun {
        let mut results = Vec::with_capacity(specs.len());

        for spec in specs {
            match self.pack_one(spec, options).await {
                Ok(result) => results.push(result),
                Err(err) => {
                    debug!("Stopping at {}: {:#}", spec, err);
                    return PackRun {
                        results,
                        error: Some(err),
                    };
                }
            }
        }

        PackRun {
            results,
            error: None,
        }
    }

    async fn pack_one(&self, spec: &PackSpec, options: &PackOptions) -> Result<ArchiveResult> {
        let manifest = self
            .resolver
            .manifest(spec)
            .await
            .map_err(PackError::Resolver)?;
        manifest.validate()?;

        let filename = derive_filename(&manifest);
        debug!("Packing {} as {}", manifest.id(), filename);

        self.progress.show_progress();
        let packed = self.packer.pack(spec, &manifest, &filename, options).await;
        self.progress.clear_progress();
        let packed = packed.map_err(PackError::Packer)?;

        let result = ArchiveResult::new(&manifest, filename, packed.size, packed.files);
        if !options.json {
            log_tarball(self.progress, &result, options.unicode);
        }
        self.reporter.report(&result, options)?;

        Ok(result)
    }
}
