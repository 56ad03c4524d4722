//! Application layer - the pack use case and the target resolution feeding it.
//!
//! The CLI layer builds the collaborators; this layer decides what gets packed
//! and in which order.

mod pack;
mod targets;

pub use crate::package::PackOptions;
pub use pack::{PackRun, PackUseCase};
pub use targets::{TargetResolver, WorkspaceSelection};
