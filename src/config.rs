//! Configuration file support for cargo-worstcase
//!
//! This module handles parsing and applying `.worstcase.toml` configuration
//! files that tune the analysis and teach it the cost of project-specific
//! method calls.
//!
//! ## Configuration File Format
//!
//! ```toml
//! # .worstcase.toml
//!
//! [analysis]
//! # Render O(n) instead of O(3n)
//! clean = true
//!
//! # Exclude test code (#[test], #[cfg(test)]) from analysis
//! exclude_tests = false
//!
//! # Files to completely exclude from analysis, relative to the directory
//! # holding this file
//! exclude = ["src/generated/*"]
//!
//! [calls]
//! # Extra or overridden method-call costs, by member name
//! binary_search = "log(n)"
//! dedup = "n"
//!
//! [thresholds]
//! # Fail the run when any file's time grows faster than this budget
//! # (same as `--max-time`)
//! max_time = "n^2"
//! ```

use glob::Pattern;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::analyzer::{AnalysisOptions, ComplexityAnalyzer};
use crate::calls::CallTable;
use crate::complexity::ComplexityExpr;

/// Errors that can occur when loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    PatternError(String),

    #[error("Invalid complexity expression: {0}")]
    ExpressionError(String),
}

/// Analysis configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    /// Drop coefficients from rendered complexities
    #[serde(default = "default_clean")]
    pub clean: bool,

    /// Exclude test code from analysis (#[test], #[cfg(test)])
    #[serde(default)]
    pub exclude_tests: bool,

    /// Files to completely exclude from analysis
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_clean() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            clean: default_clean(),
            exclude_tests: false,
            exclude: Vec::new(),
        }
    }
}

/// Threshold configuration section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ThresholdsConfig {
    /// Largest acceptable time complexity, e.g. `"n^2"`
    #[serde(default)]
    pub max_time: Option<String>,
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WorstcaseConfig {
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Member name -> complexity expression
    #[serde(default)]
    pub calls: HashMap<String, String>,

    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

/// Configuration with patterns and expressions parsed
#[derive(Debug)]
pub struct CompiledConfig {
    pub options: AnalysisOptions,
    exclude_patterns: Vec<Pattern>,
    /// Default call table extended with the `[calls]` section
    pub calls: CallTable,
    pub max_time: Option<ComplexityExpr>,
    /// Directory exclude patterns are relative to; the current directory
    /// when unset
    pub base_dir: Option<PathBuf>,
}

impl CompiledConfig {
    /// Create a compiled config from raw config
    pub fn from_config(config: WorstcaseConfig) -> Result<Self, ConfigError> {
        let exclude_patterns = config
            .analysis
            .exclude
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| ConfigError::PatternError(format!("{}: {}", p, e))))
            .collect::<Result<Vec<_>, _>>()?;

        let parse_expression = |text: &str| -> Result<ComplexityExpr, ConfigError> {
            text.parse()
                .map_err(|e| ConfigError::ExpressionError(format!("{}: {}", text, e)))
        };

        let mut calls = CallTable::default();
        for (member, cost) in &config.calls {
            calls.insert(member.clone(), parse_expression(cost)?);
        }

        let max_time = config
            .thresholds
            .max_time
            .as_deref()
            .map(parse_expression)
            .transpose()?;

        Ok(Self {
            options: AnalysisOptions {
                clean: config.analysis.clean,
                exclude_tests: config.analysis.exclude_tests,
            },
            exclude_patterns,
            calls,
            max_time,
            base_dir: None,
        })
    }

    /// Create an empty config (no overrides)
    pub fn empty() -> Self {
        Self {
            options: AnalysisOptions::default(),
            exclude_patterns: Vec::new(),
            calls: CallTable::default(),
            max_time: None,
            base_dir: None,
        }
    }

    /// Check if a path should be completely excluded from analysis
    pub fn should_exclude(&self, path: &str) -> bool {
        self.exclude_patterns.iter().any(|p| p.matches(path))
    }

    /// Check a file path found on disk, matching it relative to
    /// [`base_dir`](Self::base_dir)
    pub fn should_exclude_path(&self, path: &Path) -> bool {
        if self.exclude_patterns.is_empty() {
            return false;
        }
        self.should_exclude(&self.relative_to_base(path).to_string_lossy())
    }

    fn relative_to_base(&self, path: &Path) -> PathBuf {
        let base = match &self.base_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        let resolve = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());

        match resolve(path).strip_prefix(resolve(&base)) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => path
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect(),
        }
    }

    /// Build an analyzer from these settings
    pub fn analyzer(&self) -> ComplexityAnalyzer {
        ComplexityAnalyzer::new(self.options).with_call_table(self.calls.clone())
    }
}

/// Load configuration from the project directory
///
/// Searches for `.worstcase.toml` in the given directory and parent directories.
pub fn load_config(project_path: &Path) -> Result<WorstcaseConfig, ConfigError> {
    match find_config_file(project_path) {
        Some(path) => load_config_file(&path),
        None => Ok(WorstcaseConfig::default()),
    }
}

/// Load a specific configuration file
pub fn load_config_file(path: &Path) -> Result<WorstcaseConfig, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let content = fs::read_to_string(path)?;
    let config: WorstcaseConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Find the config file by searching up the directory tree
fn find_config_file(start_path: &Path) -> Option<PathBuf> {
    let config_names = [".worstcase.toml", "worstcase.toml"];

    let mut current = if start_path.is_file() {
        start_path.parent()?.to_path_buf()
    } else {
        start_path.to_path_buf()
    };

    loop {
        for name in &config_names {
            let config_path = current.join(name);
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // Move to parent directory
        if let Some(parent) = current.parent() {
            current = parent.to_path_buf();
        } else {
            break;
        }
    }

    None
}

/// Load and compile configuration
///
/// Exclude patterns are anchored at the directory of the config file found.
pub fn load_compiled_config(project_path: &Path) -> Result<CompiledConfig, ConfigError> {
    match find_config_file(project_path) {
        Some(path) => load_compiled_config_file(&path),
        None => CompiledConfig::from_config(WorstcaseConfig::default()),
    }
}

/// Load and compile a specific configuration file
pub fn load_compiled_config_file(path: &Path) -> Result<CompiledConfig, ConfigError> {
    let mut compiled = CompiledConfig::from_config(load_config_file(path)?)?;
    compiled.base_dir = path.parent().map(Path::to_path_buf);
    Ok(compiled)
}
