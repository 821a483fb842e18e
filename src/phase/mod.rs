use anyhow::Result;

use crate::config::Config;
use crate::locate::Locator;
use crate::shadow::ArtifactStore;

mod archive;
mod compile;
mod mv;

/// Everything a phase policy needs to decide on a shadow invocation.
pub struct PatchContext<'a> {
    pub config: &'a Config,
    pub store: &'a dyn ArtifactStore,
    pub locator: &'a dyn Locator,
}

/// Per-tool policy for deriving a cross-toolchain argument list from one
/// native invocation. `None` means this invocation gets no shadow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Compile,
    Archive,
    Move,
}

impl Phase {
    pub fn patch_args(&self, args: &[String], ctx: &PatchContext) -> Result<Option<Vec<String>>> {
        match self {
            Phase::Compile => compile::patch_args(args, ctx),
            Phase::Archive => archive::patch_args(args, ctx),
            Phase::Move => mv::patch_args(args, ctx),
        }
    }
}
