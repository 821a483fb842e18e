use std::collections::BTreeMap;

use anyhow::{Context, Result};
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::locate::Locator;
use crate::shadow::ShadowKind;

/// Name of the per-tree configuration file, found by upward search from
/// the working directory.
pub const CONFIG_FILE: &str = "wasi-cross.json";

/// Per-path build overrides, keyed by native artifact path (exact string).
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct Config(BTreeMap<String, Override>);

impl Config {
    /// Load the nearest configuration file. A missing file is an empty
    /// configuration; a malformed one is a hard error, since applying half
    /// a configuration would desynchronize shadow artifacts silently.
    pub fn load_nearest(locator: &dyn Locator) -> Result<Config> {
        let Some(path) = locator.closest(CONFIG_FILE) else {
            return Ok(Config::default());
        };
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn get(&self, path: &str) -> Option<&Override> {
        self.0.get(path)
    }

    /// Whether the configuration marks a shadow output path as skipped.
    pub fn skips(&self, shadow_path: &str) -> bool {
        self.get(shadow_path).is_some_and(|ov| ov.skip)
    }
}

/// One override record from `wasi-cross.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Override {
    /// Replacement shadow output path, taking precedence over the suffix
    /// convention.
    pub output: Option<String>,
    /// Shadow artifact kind; an object if unspecified.
    #[serde(rename = "type")]
    pub kind: Option<ShadowKind>,
    /// Cancel the shadow build for this path entirely.
    #[serde(default)]
    pub skip: bool,
    /// Extra arguments appended to the cross invocation.
    #[serde(default)]
    pub args: Vec<String>,
    /// Patterns of arguments dropped from the cross invocation.
    #[serde(default)]
    pub noargs: Vec<Pattern>,
}

/// An argument-filter pattern: a literal string, or a regular expression
/// written as `re:<pattern>` in the configuration file.
#[derive(Debug, Clone)]
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

impl Pattern {
    pub fn parse(text: &str) -> Result<Pattern, regex::Error> {
        match text.strip_prefix("re:") {
            Some(pattern) => Regex::new(pattern).map(Pattern::Regex),
            None => Ok(Pattern::Literal(text.to_string())),
        }
    }

    /// Whether an argument matches. Regex patterns match by search,
    /// literals by equality.
    pub fn matches(&self, arg: &str) -> bool {
        match self {
            Pattern::Literal(literal) => literal == arg,
            Pattern::Regex(regex) => regex.is_match(arg),
        }
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Pattern::parse(&text).map_err(de::Error::custom)
    }
}
