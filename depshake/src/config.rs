use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::CONFIG_FILENAME;

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The main configuration section for depshake.
    pub depshake: DepshakeConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults or programmatic config.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
/// Configuration options for depshake.
pub struct DepshakeConfig {
    /// Primary package name, used as the default root module.
    pub package: Option<String>,
    /// Directories searched for compiled module artifacts, in order.
    pub search_path: Option<Vec<PathBuf>>,
    /// Directories holding module sources rewritten by `--fix`.
    pub source_roots: Option<Vec<PathBuf>>,
    /// Extension of source files.
    pub source_extension: Option<String>,
    /// Override document path.
    pub config: Option<PathBuf>,
    /// Whether downstream repair is enabled.
    pub downstream: Option<bool>,
    /// Number of worker threads.
    pub threads: Option<usize>,
}

impl Config {
    /// Loads configuration from the current directory or one of its parents.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from_path(Path::new("."))
    }

    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// A settings file that cannot be read or parsed is reported on stderr
    /// and the defaults are used.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                let parsed = fs::read_to_string(&candidate)
                    .map_err(|e| e.to_string())
                    .and_then(|content| {
                        toml::from_str::<Config>(&content).map_err(|e| e.to_string())
                    });
                return match parsed {
                    Ok(mut config) => {
                        config.config_file_path = Some(candidate);
                        config
                    }
                    Err(e) => {
                        eprintln!(
                            "{} ignoring {}: {e}",
                            "Warning:".yellow().bold(),
                            candidate.display()
                        );
                        Config::default()
                    }
                };
            }

            if !current.pop() {
                break;
            }
        }

        Config::default()
    }

    /// Resolve a path from the settings file against the file's directory.
    /// Absolute paths and programmatic configs are returned unchanged.
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match self.config_file_path.as_deref().and_then(Path::parent) {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
