//! TOML package descriptors and per-format resolution.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::info::{Info, Overridables};
use crate::merge::Merge;

/// Errors raised while loading a descriptor.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The descriptor file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML content did not match the descriptor schema.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// An `overrides` block names a format nobody can build.
    #[error("no packager registered for the format {0}")]
    NoPackager(String),
}

/// A parsed descriptor: the base package plus per-format overrides.
///
/// ```toml
/// name = "foo"
/// arch = "amd64"
/// version = "v1.2.3"
/// depends = ["bash"]
///
/// [overrides.deb]
/// depends = ["bash", "libc6"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// The base descriptor shared by every format.
    #[serde(flatten)]
    pub info: Info,
    /// Format name to the fields replaced for that format.
    #[serde(default)]
    pub overrides: BTreeMap<String, Overridables>,
}

impl Config {
    /// Read and parse a descriptor file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, or
    /// `ConfigError::Parse` if the TOML content is invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a descriptor and expand `$VAR`/`${VAR}` in version and release.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the TOML content is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.info.version = expand_env(&config.info.version);
        config.info.release = expand_env(&config.info.release);
        Ok(config)
    }

    /// Reject override blocks for formats that `is_known` does not accept.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoPackager` naming the first unknown format.
    pub fn validate(&self, is_known: impl Fn(&str) -> bool) -> Result<(), ConfigError> {
        match self.overrides.keys().find(|format| !is_known(format)) {
            Some(format) => Err(ConfigError::NoPackager(format.clone())),
            None => Ok(()),
        }
    }

    /// The descriptor resolved for one format, with defaults applied.
    pub fn get(&self, format: &str) -> Info {
        let mut info = self.info.clone();
        if let Some(over) = self.overrides.get(format) {
            info.overridables = info.overridables.merge(over.clone());
        }
        info.with_defaults()
    }
}

/// Replace `$VAR` and `${VAR}` with environment values (empty when unset).
pub fn expand_env(input: &str) -> String {
    static VAR: OnceLock<Regex> = OnceLock::new();
    let re = VAR.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
            .unwrap_or_else(|_| unreachable!("static pattern"))
    });
    re.replace_all(input, |caps: &Captures<'_>| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_default()
    })
    .into_owned()
}
