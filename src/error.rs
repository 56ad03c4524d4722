//! Error taxonomy for a pack run.
//!
//! Every variant is fatal: the run stops at the first one and nothing is retried.
//! Errors travel as `anyhow::Error`; callers recover the kind with
//! `err.downcast_ref::<PackError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackError {
    /// The resolved manifest has no name or no version.
    #[error("Invalid package, must have name and version")]
    InvalidPackument,

    /// Manifest lookup failed. The underlying message is kept verbatim.
    #[error(transparent)]
    Resolver(anyhow::Error),

    /// A workspace selection matched nothing. Raised before any packing.
    #[error("{0}")]
    NoTargets(String),

    /// Creating or writing the archive failed. The underlying message is kept verbatim.
    #[error(transparent)]
    Packer(anyhow::Error),

    /// A command-line target could not be understood.
    #[error("Invalid package spec {0:?}: {1}")]
    InvalidSpec(String, String),
}

impl PackError {
    /// Short machine-readable code, used in `--json` error output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPackument => "EINVALIDPACKUMENT",
            Self::Resolver(_) => "ERESOLVE",
            Self::NoTargets(_) => "ENOWORKSPACES",
            Self::Packer(_) => "EPACK",
            Self::InvalidSpec(..) => "EINVALIDSPEC",
        }
    }
}
