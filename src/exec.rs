use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

use crate::phase::PatchContext;
use crate::tools::{Tool, ToolResolver};

/// Runs one tool as a subprocess with inherited standard streams,
/// reporting its exit code.
pub trait ToolRunner {
    fn run(&mut self, program: &Path, args: &[String]) -> Result<i32>;
}

/// Production runner backed by `std::process`.
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&mut self, program: &Path, args: &[String]) -> Result<i32> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to run {}", program.display()))?;
        // Signal-terminated children carry no code; treat as plain failure.
        Ok(status.code().unwrap_or(1))
    }
}

/// Runs the native invocation exactly as given, then the cross invocation
/// the phase policy derives from it, if any.
pub struct DualExecutor<'a> {
    pub resolver: &'a dyn ToolResolver,
    pub runner: &'a mut dyn ToolRunner,
}

impl DualExecutor<'_> {
    /// Returns the exit status the engine propagates: the first non-zero
    /// status of the two steps, else zero. A cross failure is as fatal as
    /// a native one.
    pub fn run(&mut self, tool: Tool, args: &[String], ctx: &PatchContext) -> Result<i32> {
        // The native step is unconditional; the native build's correctness
        // must be unaffected by this engine's presence.
        let native = self.resolver.native(tool)?;
        let status = self.runner.run(&native, args)?;
        if status != 0 {
            return Ok(status);
        }

        match tool.phase().patch_args(args, ctx)? {
            Some(patched) if !patched.is_empty() => {
                let cross = self.resolver.cross(tool)?;
                self.runner.run(&cross, &patched)
            }
            _ => Ok(0),
        }
    }
}
