use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::phase::Phase;

/// Default WASI SDK installation root, overridable via `WASI_SDK_PATH`.
const DEFAULT_SDK_ROOT: &str = "/opt/wasi-sdk";

/// All wrapped tool names, as they appear on the search path.
pub const WRAPPED_TOOLS: &[&str] = &["clang", "clang++", "ar", "mv"];

/// A build tool this engine wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Clang,
    ClangXx,
    Ar,
    Mv,
}

impl Tool {
    /// Match the basename the engine was invoked as.
    pub fn from_name(name: &str) -> Option<Tool> {
        match name {
            "clang" => Some(Tool::Clang),
            "clang++" => Some(Tool::ClangXx),
            "ar" => Some(Tool::Ar),
            "mv" => Some(Tool::Mv),
            _ => None,
        }
    }

    /// The phase policy governing this tool's invocations.
    pub fn phase(&self) -> Phase {
        match self {
            Tool::Clang | Tool::ClangXx => Phase::Compile,
            Tool::Ar => Phase::Archive,
            Tool::Mv => Phase::Move,
        }
    }
}

/// Resolves a wrapped tool to concrete native and cross binaries. The
/// production entry point wires this to the fixed native locations and the
/// WASI SDK tree; tests substitute stub paths.
pub trait ToolResolver {
    fn native(&self, tool: Tool) -> Result<PathBuf>;
    fn cross(&self, tool: Tool) -> Result<PathBuf>;
}

/// Production resolver: fixed native tool locations plus a WASI SDK tree.
pub struct SdkResolver {
    sdk_root: PathBuf,
}

impl SdkResolver {
    pub fn from_env() -> Self {
        let sdk_root = env::var_os("WASI_SDK_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SDK_ROOT));
        Self { sdk_root }
    }
}

impl ToolResolver for SdkResolver {
    fn native(&self, tool: Tool) -> Result<PathBuf> {
        Ok(PathBuf::from(match tool {
            Tool::Clang => "/usr/bin/clang",
            Tool::ClangXx => "/usr/bin/clang++",
            Tool::Ar => "/usr/bin/ar",
            Tool::Mv => "/bin/mv",
        }))
    }

    fn cross(&self, tool: Tool) -> Result<PathBuf> {
        let bin = match tool {
            Tool::Clang => "clang",
            Tool::ClangXx => "clang++",
            Tool::Ar => "llvm-ar",
            // Moving files is target-independent.
            Tool::Mv => return Ok(PathBuf::from("/bin/mv")),
        };
        if !self.sdk_root.exists() {
            bail!(
                "WASI SDK not found at {}.\n\
                 Install from https://github.com/WebAssembly/wasi-sdk/releases \
                 or point WASI_SDK_PATH at an existing installation.",
                self.sdk_root.display()
            );
        }
        Ok(self.sdk_root.join("bin").join(bin))
    }
}
