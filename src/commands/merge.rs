//! Comando merge - Junta arquivos fonte num único .txt para revisão

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;
use colored::*;

use crate::core::config::{self, FileConfig};
use crate::core::merge::{self, MergeError};
use crate::core::utils;

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Diretório a percorrer
    pub directory: PathBuf,

    /// Arquivo de saída (padrão: <diretório>/merged_sources.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extensões a incluir (padrão: .hpp .cpp)
    #[arg(short, long, num_args = 1..)]
    pub extensions: Vec<String>,

    /// Não desce em subdiretórios
    #[arg(long)]
    pub no_recursive: bool,
}

pub fn run(args: MergeArgs, file: &FileConfig) -> Result<ExitCode> {
    let directory = std::path::absolute(&args.directory).unwrap_or(args.directory);

    let output = match args.output {
        Some(path) if path.is_relative() => directory.join(path),
        Some(path) => path,
        None => directory.join(config::merge::OUTPUT),
    };

    let extensions = if !args.extensions.is_empty() {
        merge::normalize_extensions(&args.extensions)
    } else if let Some(exts) = &file.merge.extensions {
        merge::normalize_extensions(exts)
    } else {
        merge::normalize_extensions(config::merge::EXTENSIONS)
    };

    println!("{}", "📄 Juntando arquivos fonte...".bright_yellow());
    println!("   Diretório: {}", directory.display().to_string().bright_cyan());
    println!("   Extensões: {}", extensions.join(", ").bright_green());
    println!(
        "   Recursivo: {}",
        if args.no_recursive { "não" } else { "sim" }
    );
    println!("   Saída: {}", output.display().to_string().bright_cyan());
    println!();

    let files = match merge::find_sources(&directory, &extensions, !args.no_recursive, Some(&output))
    {
        Ok(files) => files,
        Err(err @ (MergeError::NotFound(_) | MergeError::NotADirectory(_))) => {
            utils::print_error(&err.to_string());
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err.into()),
    };

    if files.is_empty() {
        utils::print_warning(&format!(
            "Nenhum arquivo encontrado em {}",
            directory.display()
        ));
        return Ok(ExitCode::FAILURE);
    }

    utils::print_step(&format!("Encontrados {} arquivo(s)", files.len()));

    let report = merge::merge_files(&files, &output, &directory)?;

    for path in &report.written {
        println!("     {} {}", "+".bright_green(), path.display());
    }
    for (path, reason) in &report.skipped {
        utils::print_warning(&format!("Não foi possível ler {}: {}", path.display(), reason));
    }

    println!();
    utils::print_success(&format!(
        "Arquivos combinados em {}",
        output.display().to_string().bright_cyan()
    ));
    println!("   Tamanho: {:.2} KB", report.bytes as f64 / 1024.0);

    Ok(ExitCode::SUCCESS)
}
