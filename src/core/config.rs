//! Configuration module - Build configuration and constants
//!
//! Constants shared by the commands plus the optional `tongs.toml` file.
//! Values given on the command line always win over the file, and the file
//! wins over the built-in defaults below.

use std::fmt;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::Deserialize;
use thiserror::Error;

/// Name of the optional configuration file looked up in the current directory
pub const CONFIG_FILE: &str = "tongs.toml";

/// Conan command line pieces
pub mod conan {
    /// Default external tool
    pub const TOOL: &str = "conan";

    /// Subcommand that exports a recipe and builds its package
    pub const CREATE: &str = "create";

    /// Settings flag, followed by `key=value`
    pub const SETTING: &str = "-s";

    /// Build from source whatever has no prebuilt binary
    pub const BUILD_MISSING: &str = "--build=missing";

    /// Marker file of a recipe directory
    pub const MANIFEST: &str = "conanfile.py";
}

/// Source dump defaults
pub mod merge {
    /// Output file name, created inside the scanned directory
    pub const OUTPUT: &str = "merged_sources.txt";

    /// Extensions collected when none are given
    pub const EXTENSIONS: &[&str] = &[".hpp", ".cpp"];
}

/// Width of the `=====` separator lines
pub const RULE_WIDTH: usize = 80;

/// Build type passed through to Conan as `-s build_type=<value>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
pub enum BuildType {
    #[default]
    #[value(name = "Debug")]
    Debug,
    #[value(name = "Release")]
    Release,
    #[value(name = "RelWithDebInfo")]
    RelWithDebInfo,
    #[value(name = "MinSizeRel")]
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `tongs.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub build: BuildSection,
    pub merge: MergeSection,

    /// Where the file was loaded from, if anywhere
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// `[build]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    /// Relative paths are taken from the directory holding the config file
    pub recipe_dir: Option<PathBuf>,
    pub build_type: Option<BuildType>,
    pub tool: Option<String>,
    pub manifest: Option<String>,
    pub fail_fast: Option<bool>,
}

/// `[merge]` table
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeSection {
    pub extensions: Option<Vec<String>>,
}

impl FileConfig {
    /// Parse the file contents. `path` is used for error messages and to
    /// anchor a relative `recipe_dir`.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: FileConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(dir) = config.build.recipe_dir.take() {
            let anchored = match path.parent() {
                Some(base) if dir.is_relative() => base.join(dir),
                _ => dir,
            };
            config.build.recipe_dir = Some(anchored);
        }

        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load a config file from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// An explicit path must exist; otherwise `./tongs.toml` is used when
    /// present and the defaults when not.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let implicit = Path::new(CONFIG_FILE);
        if implicit.is_file() {
            tracing::debug!(path = %implicit.display(), "using config file");
            Self::load(implicit)
        } else {
            Ok(Self::default())
        }
    }
}
