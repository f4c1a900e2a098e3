//! Comando build - Constrói todas as receitas (conan create)

use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::core::builder::{
    self, BuildOutcome, BuildResult, BuildSummary, Invocation, ProcessRunner, Reporter,
    RunConfig, RunError,
};
use crate::core::config::{BuildType, FileConfig};
use crate::core::recipe::Recipe;
use crate::core::utils;

/// Exit status after a user interrupt (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Diretório das receitas (padrão: .)
    #[arg(short = 'd', long)]
    pub recipe_dir: Option<PathBuf>,

    /// Tipo de build repassado ao conan (padrão: Debug)
    #[arg(short, long, value_enum, ignore_case = true)]
    pub build_type: Option<BuildType>,

    /// Apenas mostra os comandos, sem executar
    #[arg(long)]
    pub dry_run: bool,

    /// Para na primeira falha (as demais receitas são ignoradas)
    #[arg(long)]
    pub fail_fast: bool,

    /// Executável do conan
    #[arg(long, env = "TONGS_CONAN")]
    pub tool: Option<String>,

    /// Arquivo que identifica uma receita (padrão: conanfile.py)
    #[arg(long)]
    pub manifest: Option<String>,
}

impl BuildArgs {
    /// Command line first, then `tongs.toml`, then defaults
    pub fn resolve(self, file: &FileConfig, verbose: bool) -> RunConfig {
        let section = &file.build;
        let root = self
            .recipe_dir
            .or_else(|| section.recipe_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let root = std::fs::canonicalize(&root)
            .or_else(|_| std::path::absolute(&root))
            .unwrap_or(root);

        let mut config = RunConfig::new(root);
        config.build_type = self.build_type.or(section.build_type).unwrap_or_default();
        config.verbose = verbose;
        config.dry_run = self.dry_run;
        config.fail_fast = self.fail_fast || section.fail_fast.unwrap_or(false);
        if let Some(tool) = self.tool.or_else(|| section.tool.clone()) {
            config.tool = tool;
        }
        if let Some(manifest) = self.manifest.or_else(|| section.manifest.clone()) {
            config.manifest = manifest;
        }
        config
    }
}

pub fn run(args: BuildArgs, file: &FileConfig, verbose: bool) -> Result<ExitCode> {
    let config = args.resolve(file, verbose);

    println!("{}", "📦 Construindo receitas Conan...".bright_yellow());
    println!(
        "   Diretório: {}",
        config.root.display().to_string().bright_cyan()
    );
    println!(
        "   Tipo de build: {}",
        config.build_type.to_string().bright_green()
    );
    if config.dry_run {
        utils::print_info("Modo dry-run: nenhum comando será executado");
    }
    println!();

    let reporter = ConsoleReporter::new(config.verbose);
    let outcome = builder::run_all(&config, &ProcessRunner, &reporter);
    reporter.finish();

    match outcome {
        Ok(report) => {
            let failures = report.failure_count();
            println!();
            if failures > 0 {
                utils::print_error(&format!("{} receita(s) falharam", failures));
                Ok(ExitCode::FAILURE)
            } else {
                println!(
                    "{}",
                    "✓ Todas as receitas foram construídas!".bright_green().bold()
                );
                Ok(ExitCode::SUCCESS)
            }
        }
        Err(RunError::Discovery(err)) => {
            // Nothing was built, so there is nothing that failed.
            utils::print_error(&err.to_string());
            Ok(ExitCode::SUCCESS)
        }
        Err(err @ RunError::Interrupted { .. }) => {
            eprintln!();
            utils::print_error(&format!("Interrompido pelo usuário ({})", err));
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
    }
}

/// Prints the progress of a run. A progress bar is shown while Conan's
/// output is being captured; in verbose mode the output itself is the
/// progress.
struct ConsoleReporter {
    verbose: bool,
    bar: OnceCell<ProgressBar>,
}

impl ConsoleReporter {
    fn new(verbose: bool) -> Self {
        Self {
            verbose,
            bar: OnceCell::new(),
        }
    }

    /// Print without tearing the progress bar
    fn line(&self, print: impl FnOnce()) {
        match self.bar.get() {
            Some(bar) => bar.suspend(print),
            None => print(),
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.get() {
            bar.finish_and_clear();
        }
    }
}

impl Reporter for ConsoleReporter {
    fn discovered(&self, root: &Path, recipes: &[Recipe]) {
        if recipes.is_empty() {
            utils::print_warning(&format!(
                "Nenhuma receita encontrada em {}",
                root.display()
            ));
            return;
        }

        println!("Encontrada(s) {} receita(s):", recipes.len());
        for recipe in recipes {
            println!("  - {}", recipe.name.bright_green());
        }

        if !self.verbose {
            let bar = ProgressBar::new(recipes.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar.enable_steady_tick(Duration::from_millis(120));
            let _ = self.bar.set(bar);
        }
    }

    fn started(&self, recipe: &Recipe, invocation: &Invocation, config: &RunConfig) {
        self.line(|| {
            let rule = utils::rule();
            println!("\n{}", rule);
            println!(
                "📦 Receita: {} ({})",
                recipe.name.bright_cyan().bold(),
                config.build_type
            );
            println!("{}", rule);

            if config.verbose || config.dry_run {
                println!("   Comando: {}", invocation.to_string().bright_black());
            }
            if config.dry_run {
                println!("   (modo dry-run, execução ignorada)");
            }
        });

        if let Some(bar) = self.bar.get() {
            bar.set_message(format!("construindo {}", recipe.name));
        }
    }

    fn finished(&self, result: &BuildResult) {
        let name = &result.recipe.name;

        self.line(|| match &result.outcome {
            BuildOutcome::Success => utils::print_success(&format!("Construída: {}", name)),
            BuildOutcome::Simulated => utils::print_info(&format!("Simulada: {}", name)),
            BuildOutcome::Skipped => {
                utils::print_warning(&format!("Ignorada (fail-fast): {}", name))
            }
            failure => {
                utils::print_error(&format!("Falha na construção: {} ({})", name, failure));
                if let Some(output) = &result.captured_output {
                    eprintln!("{}", "Saída de erro:".bright_red());
                    eprintln!("{}", output);
                }
            }
        });

        if let Some(bar) = self.bar.get() {
            bar.inc(1);
        }
    }

    fn summary(&self, summary: &BuildSummary) {
        self.line(|| {
            let rule = utils::rule();
            println!("\n{}", rule);
            println!("Resumo da construção:");
            println!("  Total: {}", summary.total);
            println!("  Sucesso: {}", summary.succeeded.to_string().bright_green());
            println!("  Falha: {}", summary.failed.to_string().bright_red());
            if summary.skipped > 0 {
                println!("  Ignoradas: {}", summary.skipped.to_string().bright_yellow());
            }
            println!("{}", rule);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> BuildArgs {
        BuildArgs {
            recipe_dir: None,
            build_type: None,
            dry_run: false,
            fail_fast: false,
            tool: None,
            manifest: None,
        }
    }

    #[test]
    fn defaults_without_file_or_flags() {
        let config = args().resolve(&FileConfig::default(), false);

        assert!(config.root.is_absolute());
        assert_eq!(config.build_type, BuildType::Debug);
        assert_eq!(config.tool, "conan");
        assert_eq!(config.manifest, "conanfile.py");
        assert!(!config.fail_fast);
    }

    #[test]
    fn file_fills_in_missing_flags() {
        let file = FileConfig::parse(
            "[build]\nrecipe_dir = \"/srv/recipes\"\nbuild_type = \"Release\"\nfail_fast = true\n",
            Path::new("tongs.toml"),
        )
        .unwrap();

        let config = args().resolve(&file, true);

        assert_eq!(config.root, PathBuf::from("/srv/recipes"));
        assert_eq!(config.build_type, BuildType::Release);
        assert!(config.fail_fast);
        assert!(config.verbose);
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig::parse(
            "[build]\nbuild_type = \"Release\"\ntool = \"conan2\"\n",
            Path::new("tongs.toml"),
        )
        .unwrap();

        let mut cli = args();
        cli.build_type = Some(BuildType::MinSizeRel);
        cli.tool = Some("/usr/local/bin/conan".to_string());
        cli.recipe_dir = Some(PathBuf::from("/work/conan_recipe"));

        let config = cli.resolve(&file, false);

        assert_eq!(config.build_type, BuildType::MinSizeRel);
        assert_eq!(config.tool, "/usr/local/bin/conan");
        assert_eq!(config.root, PathBuf::from("/work/conan_recipe"));
    }

    #[test]
    fn existing_recipe_dir_is_canonicalized() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();

        let mut cli = args();
        cli.recipe_dir = Some(temp.path().join("nested").join(".."));

        let config = cli.resolve(&FileConfig::default(), false);

        assert_eq!(config.root, std::fs::canonicalize(temp.path()).unwrap());
    }
}
