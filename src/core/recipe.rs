//! Recipe module - Discovery of local Conan recipes
//!
//! A recipe is an immediate subdirectory of the recipe root that holds a
//! manifest file (`conanfile.py` by default).

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

/// A recipe directory found under the recipe root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub name: String,
    pub path: PathBuf,
}

impl Recipe {
    /// Returns a recipe when `dir` is a directory containing `manifest`
    pub fn from_dir(dir: &Path, manifest: &str) -> Option<Self> {
        if !dir.is_dir() {
            trace!(path = %dir.display(), "not a directory, skipping");
            return None;
        }

        if !dir.join(manifest).is_file() {
            debug!(path = %dir.display(), manifest, "no manifest, skipping");
            return None;
        }

        let name = dir.file_name()?.to_string_lossy().into_owned();
        Some(Self {
            name,
            path: dir.to_path_buf(),
        })
    }
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Directory does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// List the recipes directly under `root`, sorted by directory name
pub fn discover(root: &Path, manifest: &str) -> Result<Vec<Recipe>, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::NotFound(root.to_path_buf()));
    }

    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    let io_err = |source| DiscoveryError::Io {
        path: root.to_path_buf(),
        source,
    };

    let mut recipes = Vec::new();
    for entry in fs::read_dir(root).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if let Some(recipe) = Recipe::from_dir(&entry.path(), manifest) {
            recipes.push(recipe);
        }
    }

    recipes.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    debug!(root = %root.display(), count = recipes.len(), "discovered recipes");
    Ok(recipes)
}
