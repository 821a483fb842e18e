mod config;
mod exec;
mod hijack;
mod locate;
mod phase;
mod shadow;
mod tools;

use std::env;
use std::path::Path;
use std::process;

use anyhow::Result;
use clap::Parser;

use crate::config::Config;
use crate::exec::{DualExecutor, ProcessRunner};
use crate::locate::DirWalker;
use crate::phase::PatchContext;
use crate::shadow::FsStore;
use crate::tools::{SdkResolver, Tool};

#[derive(Parser)]
#[command(
    name = "wasi-cross",
    about = "Shadow-build WASI artifacts alongside an unmodified native build",
    version
)]
struct Cli {
    /// Build command to run with the toolchain interposed, e.g. `make`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    match run() {
        Ok(status) => process::exit(status),
        Err(err) => {
            eprintln!("wasi-cross: {err:#}");
            process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let mut argv = env::args();
    let invoked_as = argv.next().as_deref().map(basename).unwrap_or_default();
    let args: Vec<String> = argv.collect();

    // Invoked under a wrapped tool's name, the engine is that tool; under
    // its own name, it is the one-shot interposition bootstrap.
    match Tool::from_name(&invoked_as) {
        Some(tool) => run_tool(tool, &args),
        None => {
            let cli = Cli::parse();
            hijack::bootstrap(&cli.command)
        }
    }
}

fn basename(argv0: &str) -> String {
    Path::new(argv0)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// One interposed tool invocation: the native step, then the phase-derived
/// shadow step.
fn run_tool(tool: Tool, args: &[String]) -> Result<i32> {
    let walker = DirWalker::from_current_dir()?;
    let config = Config::load_nearest(&walker)?;
    let ctx = PatchContext {
        config: &config,
        store: &FsStore,
        locator: &walker,
    };

    let resolver = SdkResolver::from_env();
    let mut runner = ProcessRunner;
    let mut executor = DualExecutor {
        resolver: &resolver,
        runner: &mut runner,
    };
    executor.run(tool, args, &ctx)
}
