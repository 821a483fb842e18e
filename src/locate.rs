use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Upward-search capability shared by the configuration loader and the
/// include-landmark lookup.
///
/// Production walks parent directories from the working directory; tests
/// substitute fixed lookups so they never depend on where `cargo test` runs.
pub trait Locator {
    /// The closest entry named `name`, searching from the start directory
    /// up to the filesystem root.
    fn closest(&self, name: &str) -> Option<PathBuf>;
}

/// Filesystem-backed locator rooted at a start directory.
pub struct DirWalker {
    start: PathBuf,
}

impl DirWalker {
    pub fn new(start: PathBuf) -> Self {
        Self { start }
    }

    pub fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().context("resolving working directory")?;
        Ok(Self::new(cwd))
    }
}

impl Locator for DirWalker {
    fn closest(&self, name: &str) -> Option<PathBuf> {
        self.start
            .ancestors()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.exists())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_entries_in_ancestor_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("wasi")).unwrap();
        let nested = dir.path().join("project").join("build");
        fs::create_dir_all(&nested).unwrap();

        let walker = DirWalker::new(nested);
        assert_eq!(walker.closest("wasi"), Some(dir.path().join("wasi")));
    }

    #[test]
    fn nearest_entry_shadows_farther_ones() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("project");
        fs::create_dir_all(nested.join("wasi")).unwrap();
        fs::create_dir_all(dir.path().join("wasi")).unwrap();

        let walker = DirWalker::new(nested.clone());
        assert_eq!(walker.closest("wasi"), Some(nested.join("wasi")));
    }

    #[test]
    fn absent_entries_yield_none() {
        let dir = tempfile::tempdir().unwrap();
        let walker = DirWalker::new(dir.path().to_path_buf());
        assert_eq!(walker.closest("wasi-cross-no-such-entry"), None);
    }
}
