//! Comando list - Lista as receitas encontradas

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::*;

use crate::core::config::{FileConfig, conan};
use crate::core::recipe;
use crate::core::utils;

pub fn run(recipe_dir: Option<PathBuf>, manifest: Option<String>, file: &FileConfig) -> Result<()> {
    let root = recipe_dir
        .or_else(|| file.build.recipe_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let manifest = manifest
        .or_else(|| file.build.manifest.clone())
        .unwrap_or_else(|| conan::MANIFEST.to_string());

    let recipes = recipe::discover(&root, &manifest)
        .with_context(|| format!("Failed to list recipes in {}", root.display()))?;

    println!("{}", "📋 Receitas disponíveis:".bright_cyan());
    println!();

    if recipes.is_empty() {
        utils::print_warning(&format!("Nenhuma receita encontrada em {}", root.display()));
        return Ok(());
    }

    for recipe in &recipes {
        println!(
            "  {} - {}",
            recipe.name.bright_green(),
            recipe.path.display().to_string().bright_black()
        );
    }
    println!();
    println!("Use {} para construí-las", "tongs build".bright_yellow());

    Ok(())
}
