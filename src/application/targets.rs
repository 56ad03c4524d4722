//! Target resolution - turns command-line arguments and workspace selection
//! into the ordered list of specs to pack.

use anyhow::Result;
use log::{debug, warn};
use std::path::PathBuf;

use crate::error::PackError;
use crate::package::{PackSpec, discover_workspaces, filter_workspaces};
use crate::runtime::Runtime;

/// Which workspaces, if any, the invocation asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkspaceSelection {
    /// Not a workspace invocation
    #[default]
    None,
    /// Every declared workspace
    All,
    /// Workspaces matching these names or paths
    Named(Vec<String>),
}

impl WorkspaceSelection {
    pub fn from_flags(all: bool, names: Vec<String>) -> Self {
        if !names.is_empty() {
            WorkspaceSelection::Named(names)
        } else if all {
            WorkspaceSelection::All
        } else {
            WorkspaceSelection::None
        }
    }
}

pub struct TargetResolver<'a, R: Runtime> {
    runtime: &'a R,
    /// Directory the command was run from
    cwd: PathBuf,
    /// Root of the current project
    prefix: PathBuf,
}

impl<'a, R: Runtime> TargetResolver<'a, R> {
    pub fn new(runtime: &'a R, cwd: PathBuf, prefix: PathBuf) -> Self {
        Self {
            runtime,
            cwd,
            prefix,
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, args: &[String], selection: &WorkspaceSelection) -> Result<Vec<PackSpec>> {
        if *selection == WorkspaceSelection::None {
            if args.is_empty() {
                return Ok(vec![PackSpec::Directory(self.prefix.clone())]);
            }
            return self.parse_args(args.iter());
        }

        // Workspace mode only applies to the project itself
        let use_workspaces = args.is_empty() || args.iter().any(|a| a == ".");
        if !use_workspaces {
            warn!("Ignoring workspaces for specified package(s)");
            return self.parse_args(args.iter());
        }

        let members = discover_workspaces(self.runtime, &self.prefix)?;
        let selected = match selection {
            WorkspaceSelection::Named(filters) => filter_workspaces(members, filters, &self.cwd),
            _ => members,
        };

        if selected.is_empty() {
            let message = match selection {
                WorkspaceSelection::Named(filters) => format!(
                    "No workspaces found:\n {}",
                    filters
                        .iter()
                        .map(|f| format!(" --workspace={}", f))
                        .collect::<String>()
                ),
                _ => "No workspaces found!".to_string(),
            };
            return Err(PackError::NoTargets(message).into());
        }

        debug!(
            "Packing workspaces: {}",
            selected
                .iter()
                .map(|w| w.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut specs: Vec<PackSpec> = selected
            .into_iter()
            .map(|w| PackSpec::Directory(w.path))
            .collect();
        specs.extend(self.parse_args(args.iter().filter(|a| *a != "."))?);
        Ok(specs)
    }

    fn parse_args<'s>(&self, args: impl Iterator<Item = &'s String>) -> Result<Vec<PackSpec>> {
        let home = self.runtime.home_dir();
        args.map(|arg| -> Result<PackSpec> {
            let spec = arg.parse::<PackSpec>()?;
            Ok(spec.absolutize(&self.cwd, home.as_deref()))
        })
        .collect()
    }
}
