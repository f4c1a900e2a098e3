//! Comando env - Mostra ambiente
use anyhow::Result;
use colored::*;
use xshell::Shell;

use crate::core::config::{self, FileConfig, conan};
use crate::core::recipe;
use crate::core::utils;

pub fn run(tool: Option<String>, file: &FileConfig) -> Result<()> {
    println!("{}", "🔧 Ambiente:".bright_cyan());
    println!();

    println!("   tongs: {}", env!("CARGO_PKG_VERSION").bright_green());

    match &file.source {
        Some(path) => println!("   Configuração: {}", path.display().to_string().bright_cyan()),
        None => println!(
            "   Configuração: {}",
            format!("padrão (sem {})", config::CONFIG_FILE).bright_black()
        ),
    }

    let tool = tool
        .or_else(|| file.build.tool.clone())
        .unwrap_or_else(|| conan::TOOL.to_string());

    let sh = Shell::new()?;
    match sh.cmd(&tool).arg("--version").quiet().read() {
        Ok(version) => println!("   {}: {}", tool, version.trim().bright_green()),
        Err(err) => {
            utils::print_warning(&format!("'{}' não disponível", tool));
            tracing::debug!(error = %err, "version check failed");
        }
    }

    let build = &file.build;
    let root = build.recipe_dir.clone().unwrap_or_else(|| ".".into());
    let manifest = build.manifest.as_deref().unwrap_or(conan::MANIFEST);

    println!("   Receitas: {}", root.display().to_string().bright_cyan());
    println!(
        "   Tipo de build: {}",
        build.build_type.unwrap_or_default().to_string().bright_green()
    );
    println!("   Manifesto: {}", manifest.bright_green());

    match recipe::discover(&root, manifest) {
        Ok(recipes) => utils::print_info(&format!("{} receita(s) encontrada(s)", recipes.len())),
        Err(err) => utils::print_warning(&err.to_string()),
    }

    Ok(())
}
