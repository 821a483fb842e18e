use std::env;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Context, Result};

#[cfg(unix)]
use std::os::unix::fs::symlink;
#[cfg(windows)]
use std::os::windows::fs::symlink_file as symlink;

use crate::tools::WRAPPED_TOOLS;

/// Directory populated with engine symlinks named after each wrapped tool.
fn hijack_dir() -> PathBuf {
    env::temp_dir().join("wasi-cross-hijack")
}

/// Interpose the engine and delegate to `command`: every build tool the
/// command's process tree subsequently spawns resolves to this engine
/// first, while the command itself resolves to the real binary.
pub fn bootstrap(command: &[String]) -> Result<i32> {
    let dir = hijack_dir();
    install(&dir)?;

    let (name, rest) = command.split_first().context("no command to run")?;

    let path_var = env::var_os("PATH").unwrap_or_default();
    let program = resolve_real(name, &dir, &path_var)?;
    let interposed = prepend_to_path(&dir, &path_var)?;

    let status = Command::new(&program)
        .args(rest)
        .env("PATH", &interposed)
        .status()
        .with_context(|| format!("failed to run {}", program.display()))?;
    Ok(status.code().unwrap_or(1))
}

/// Create the hijack directory once. An existing directory is a previous
/// installation and is left untouched.
fn install(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let engine = env::current_exe().context("resolving engine binary path")?;
    for tool in WRAPPED_TOOLS {
        match symlink(&engine, dir.join(tool)) {
            Ok(()) => {}
            // Parallel bootstraps race to populate the directory.
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
            Err(err) => {
                return Err(err).with_context(|| format!("linking {tool} into {}", dir.display()))
            }
        }
    }
    Ok(())
}

/// The search path for the spawned process tree: the hijack directory
/// first, the rest untouched.
fn prepend_to_path(dir: &Path, path_var: &OsStr) -> Result<OsString> {
    let entries = std::iter::once(dir.to_path_buf()).chain(env::split_paths(path_var));
    env::join_paths(entries).context("rebuilding PATH")
}

/// Locate the real tool binary on the search path, never resolving into
/// the hijack directory itself. A name containing a path separator is used
/// as given.
fn resolve_real(name: &str, hijack: &Path, path_var: &OsStr) -> Result<PathBuf> {
    if name.contains('/') {
        return Ok(PathBuf::from(name));
    }
    let entries = env::split_paths(path_var).filter(|entry| entry.as_path() != hijack);
    let filtered = env::join_paths(entries).context("rebuilding PATH")?;
    let cwd = env::current_dir().context("resolving working directory")?;
    which::which_in(name, Some(filtered), cwd).map_err(|_| anyhow!("{name}: not found"))
}
