//! Tongs - Construtor das receitas Conan locais
//!
//! Pega cada receita de `conan_recipe/` e leva até a bigorna: um
//! `conan create` por receita, em sequência, com um resumo no final.
//!
//! # Uso
//! ```bash
//! tongs build -d conan_recipe --build-type Release
//! tongs list
//! tongs merge src -e .hpp .cpp
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

mod commands;
mod core;

use crate::core::config::FileConfig;
use crate::core::utils::{self, ColorChoice};

#[derive(Parser)]
#[command(name = "tongs")]
#[command(about = "🔧 Tongs - Leva as receitas Conan até a bigorna", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (saída do conan direto no terminal)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Quando colorir a saída
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Arquivo de configuração (padrão: ./tongs.toml, se existir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Constrói todas as receitas (conan create)
    Build(commands::build::BuildArgs),

    /// Lista as receitas encontradas
    List {
        /// Diretório das receitas (padrão: .)
        #[arg(short = 'd', long)]
        recipe_dir: Option<PathBuf>,

        /// Arquivo que identifica uma receita
        #[arg(long)]
        manifest: Option<String>,
    },

    /// Junta arquivos fonte num único .txt
    Merge(commands::merge::MergeArgs),

    /// Mostra ambiente
    Env {
        /// Executável do conan
        #[arg(long, env = "TONGS_CONAN")]
        tool: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "tongs=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let file = FileConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;

    // Banner
    if !cli.quiet {
        println!("{}", "🔧 Tongs - Receitas Conan".bright_cyan().bold());
        println!("{}", "   Leva as receitas até a bigorna".bright_black());
        println!();
    }

    match cli.command {
        Commands::Build(args) => commands::build::run(args, &file, cli.verbose),
        Commands::List {
            recipe_dir,
            manifest,
        } => {
            commands::list::run(recipe_dir, manifest, &file)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Merge(args) => commands::merge::run(args, &file),
        Commands::Env { tool } => {
            commands::env::run(tool, &file)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    utils::init_color(cli.color);
    init_logging(cli.verbose);

    let verbose = cli.verbose;
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            if verbose {
                utils::print_error(&format!("Erro inesperado: {:?}", err));
            } else {
                utils::print_error(&format!("Erro inesperado: {:#}", err));
            }
            ExitCode::FAILURE
        }
    }
}
