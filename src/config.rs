//! Mining configuration, persisted as TOML.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::SearchConfig;
use crate::pattern::DEFAULT_BASE_WEIGHT;

/// Errors from loading, saving or validating a configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(pathmine::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    #[diagnostic(
        code(pathmine::config::parse),
        help("Check the TOML syntax. Unknown keys are rejected.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(pathmine::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {field} {problem}")]
    #[diagnostic(
        code(pathmine::config::invalid),
        help(
            "Valid ranges: max_depth >= 1, confidence_cutoff >= 0, \
             worker_count >= 1, base_weight > 0."
        )
    )]
    Invalid { field: &'static str, problem: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Options recognized by a mining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MiningConfig {
    /// Maximum edge count of an open path.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Facts scored below this are pruned; 0 disables pruning.
    #[serde(default)]
    pub confidence_cutoff: f32,
    /// Aggregation workers.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Scale weights by document co-occurrence.
    #[serde(default)]
    pub document_factor: bool,
    /// Weight of one path occurrence.
    #[serde(default = "default_base_weight")]
    pub base_weight: f64,
    /// Let the path search attach facts to trie nodes by entity name.
    #[serde(default)]
    pub name_alias_fallback: bool,
}

fn default_max_depth() -> usize {
    3
}
fn default_worker_count() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}
fn default_base_weight() -> f64 {
    DEFAULT_BASE_WEIGHT
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            confidence_cutoff: 0.0,
            worker_count: default_worker_count(),
            document_factor: false,
            base_weight: default_base_weight(),
            name_alias_fallback: false,
        }
    }
}

impl MiningConfig {
    /// Check every option against its allowed range.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_depth == 0 {
            return Err(invalid("max_depth", "must be at least 1"));
        }
        if !self.confidence_cutoff.is_finite() || self.confidence_cutoff < 0.0 {
            return Err(invalid(
                "confidence_cutoff",
                format!("must be a non-negative number, got {}", self.confidence_cutoff),
            ));
        }
        if self.worker_count == 0 {
            return Err(invalid("worker_count", "must be at least 1"));
        }
        if !self.base_weight.is_finite() || self.base_weight <= 0.0 {
            return Err(invalid(
                "base_weight",
                format!("must be positive, got {}", self.base_weight),
            ));
        }
        Ok(())
    }

    /// Path-search settings derived from this configuration.
    pub fn search(&self) -> SearchConfig {
        SearchConfig {
            max_depth: self.max_depth,
            name_alias_fallback: self.name_alias_fallback,
        }
    }

    /// Load and validate a TOML file.
    pub fn load(path: &std::path::Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded mining config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &std::path::Path) -> ConfigResult<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

fn invalid(field: &'static str, problem: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        problem: problem.into(),
    }
}
