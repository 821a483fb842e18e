use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::config::{Config, Override};

/// Kind of shadow artifact a native path maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ShadowKind {
    #[serde(rename = "obj")]
    Object,
    #[serde(rename = "lib-archive")]
    Archive,
}

impl fmt::Display for ShadowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowKind::Object => write!(f, "obj"),
            ShadowKind::Archive => write!(f, "lib-archive"),
        }
    }
}

/// A shadow artifact derived from one native artifact path. Never
/// persisted; recomputed per invocation.
#[derive(Debug, Clone)]
pub struct ShadowTarget {
    pub kind: ShadowKind,
    pub path: String,
    /// Override record that produced this target, when one applied.
    pub rules: Option<Override>,
}

/// Map a native artifact path by suffix convention alone: `.o` becomes
/// `.wo` and `.a` becomes `.wa`. Anything else has no shadow counterpart.
pub fn map_suffix(path: &str) -> Option<ShadowTarget> {
    if let Some(stem) = path.strip_suffix(".o") {
        return Some(ShadowTarget {
            kind: ShadowKind::Object,
            path: format!("{stem}.wo"),
            rules: None,
        });
    }
    if let Some(stem) = path.strip_suffix(".a") {
        return Some(ShadowTarget {
            kind: ShadowKind::Archive,
            path: format!("{stem}.wa"),
            rules: None,
        });
    }
    None
}

/// Map a native artifact path to its shadow target. A configuration
/// override naming an output takes precedence over the suffix convention.
/// Pure; safe to call speculatively on any path-looking argument.
pub fn map_output(path: &str, config: &Config) -> Option<ShadowTarget> {
    if let Some(ov) = config.get(path) {
        if let Some(output) = &ov.output {
            return Some(ShadowTarget {
                kind: ov.kind.unwrap_or(ShadowKind::Object),
                path: output.clone(),
                rules: Some(ov.clone()),
            });
        }
    }
    map_suffix(path)
}

/// Existence oracle for shadow artifacts, separated from the real
/// filesystem so tests can simulate prior shadow builds.
pub trait ArtifactStore {
    fn exists(&self, path: &str) -> bool;
}

/// The real filesystem.
pub struct FsStore;

impl ArtifactStore for FsStore {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }
}

/// Substitute one argument for the cross invocation. Flags pass through
/// untouched. A bare argument is replaced by its shadow path only when the
/// shadow artifact already exists, so a cross build never consumes a stale
/// or native-only input; a skipped upstream step degrades every downstream
/// step the same way, with no explicit dependency tracking. Substituted
/// targets are appended to `consumed` when a collector is supplied.
pub fn patch_argument(
    arg: &str,
    config: &Config,
    store: &dyn ArtifactStore,
    consumed: Option<&mut Vec<ShadowTarget>>,
) -> String {
    if !arg.starts_with('-') {
        if let Some(target) = map_output(arg, config) {
            if store.exists(&target.path) {
                let path = target.path.clone();
                if let Some(consumed) = consumed {
                    consumed.push(target);
                }
                return path;
            }
        }
    }
    arg.to_string()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::ArtifactStore;
    use std::collections::HashSet;

    /// In-memory artifact store simulating prior shadow builds.
    pub struct MemStore(HashSet<String>);

    impl MemStore {
        pub fn of(paths: &[&str]) -> Self {
            Self(paths.iter().map(|path| path.to_string()).collect())
        }
    }

    impl ArtifactStore for MemStore {
        fn exists(&self, path: &str) -> bool {
            self.0.contains(path)
        }
    }
}
