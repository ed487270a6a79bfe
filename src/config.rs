use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// Config file looked up by `SessionConfig::discover`
pub const CONFIG_FILE_NAME: &str = "pyhost.toml";

/// Extra search path entries, in the platform's path-list syntax
pub const SEARCH_PATH_ENV: &str = "PYHOST_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub codec: CodecConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Prepended to the interpreter's module search path at start-up
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_true")]
    pub skip_private: bool,

    #[serde(default = "default_false")]
    pub callables_only: bool,

    /// Modules loaded as part of session start-up
    #[serde(default)]
    pub preload: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            search_paths: default_search_paths(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            skip_private: true,
            callables_only: false,
            preload: Vec::new(),
        }
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_search_paths() -> Vec<PathBuf> { vec![PathBuf::from(".")] }
fn default_true() -> bool { true }
fn default_false() -> bool { false }
fn default_max_depth() -> usize { crate::interop::CodecLimits::DEFAULT_MAX_DEPTH }

impl SessionConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Find `pyhost.toml` in the current directory or its parents
    pub fn discover() -> Self {
        let mut current = std::env::current_dir().ok();

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(path = %config_path.display(), error = %e, "ignoring unreadable config"),
                }
            }
            current = dir.parent().map(Path::to_path_buf);
        }

        Self::default()
    }

    /// Append search paths named in `PYHOST_PATH`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(paths) = std::env::var_os(SEARCH_PATH_ENV) {
            self.add_search_paths(std::env::split_paths(&paths));
        }
        self
    }

    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.add_search_paths([path.into()]);
        self
    }

    pub fn with_preload(mut self, module: impl Into<String>) -> Self {
        self.loader.preload.push(module.into());
        self
    }

    fn add_search_paths(&mut self, paths: impl IntoIterator<Item = PathBuf>) {
        for path in paths {
            if !self.runtime.search_paths.contains(&path) {
                self.runtime.search_paths.push(path);
            }
        }
    }

    /// Generate default configuration file content
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate config"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
