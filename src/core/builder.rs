//! Builder module - Core build functionality
//!
//! Runs `conan create` once per discovered recipe, strictly in sequence,
//! and collects one [`BuildResult`] per recipe. The external tool is reached
//! through [`CommandRunner`] so the orchestration can be exercised without
//! Conan installed.

use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::config::{BuildType, conan};
use crate::core::recipe::{self, DiscoveryError, Recipe};

/// Signal number of a terminal interrupt (Ctrl+C)
const SIGINT: i32 = 2;

/// Settings of one build run, fixed before the first recipe is built
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub root: PathBuf,
    pub build_type: BuildType,
    pub verbose: bool,
    pub dry_run: bool,
    pub fail_fast: bool,
    pub tool: String,
    pub manifest: String,
}

impl RunConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            build_type: BuildType::default(),
            verbose: false,
            dry_run: false,
            fail_fast: false,
            tool: conan::TOOL.to_string(),
            manifest: conan::MANIFEST.to_string(),
        }
    }
}

/// External command exactly as it will be spawned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
}

impl Invocation {
    /// `<tool> create <recipe> -s build_type=<type> --build=missing`
    pub fn conan_create(recipe: &Recipe, config: &RunConfig) -> Self {
        let args = vec![
            OsString::from(conan::CREATE),
            recipe.path.clone().into_os_string(),
            OsString::from(conan::SETTING),
            OsString::from(format!("build_type={}", config.build_type)),
            OsString::from(conan::BUILD_MISSING),
        ];

        let working_dir = recipe
            .path
            .parent()
            .unwrap_or(&config.root)
            .to_path_buf();

        Self {
            program: config.tool.clone(),
            args,
            working_dir,
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How a child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Code(i32),
    Signal(i32),
}

impl Exit {
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Exit::Code(code),
            None => Exit::Signal(signal_of(status)),
        }
    }
}

#[cfg(unix)]
fn signal_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or_default()
}

#[cfg(not(unix))]
fn signal_of(_status: ExitStatus) -> i32 {
    0
}

/// What a finished child left behind. Streams are empty when they were
/// passed through to the terminal.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub exit: Exit,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    /// Text worth showing after a failure: stderr, else stdout
    fn diagnostics(&self) -> Option<String> {
        [&self.stderr, &self.stdout]
            .into_iter()
            .map(|s| s.trim_end())
            .find(|s| !s.trim().is_empty())
            .map(str::to_string)
    }
}

/// Spawns external commands
pub trait CommandRunner {
    /// Run `invocation` to completion. With `capture` the child's output is
    /// collected, otherwise it goes straight to the terminal.
    fn run(&self, invocation: &Invocation, capture: bool) -> io::Result<RunOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation, capture: bool) -> io::Result<RunOutput> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir);

        debug!(
            command = %invocation,
            working_dir = %invocation.working_dir.display(),
            capture,
            "spawning process"
        );

        if capture {
            let output = command.stdin(Stdio::null()).output()?;
            Ok(RunOutput {
                exit: Exit::from_status(output.status),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = command.status()?;
            Ok(RunOutput {
                exit: Exit::from_status(status),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }
}

/// Result of building one recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    /// Dry run: nothing was spawned
    Simulated,
    NonZeroExit { code: i32 },
    LaunchFailure { cause: String },
    /// Not attempted because an earlier recipe failed under fail-fast
    Skipped,
    /// The child was stopped by the user's interrupt
    Interrupted,
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, BuildOutcome::Success | BuildOutcome::Simulated)
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::Success => f.write_str("sucesso"),
            BuildOutcome::Simulated => f.write_str("simulado (dry-run)"),
            BuildOutcome::NonZeroExit { code } => write!(f, "código de saída: {}", code),
            BuildOutcome::LaunchFailure { cause } => write!(f, "falha ao executar: {}", cause),
            BuildOutcome::Skipped => f.write_str("ignorada (fail-fast)"),
            BuildOutcome::Interrupted => f.write_str("interrompida"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub recipe: Recipe,
    pub outcome: BuildOutcome,
    /// Child output, kept only for failed builds that were captured
    pub captured_output: Option<String>,
}

impl BuildResult {
    fn new(recipe: &Recipe, outcome: BuildOutcome) -> Self {
        Self {
            recipe: recipe.clone(),
            outcome,
            captured_output: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome.succeeded()
    }

    /// Exit code of the child, when one ran and exited normally
    pub fn exit_code(&self) -> Option<i32> {
        match self.outcome {
            BuildOutcome::Success => Some(0),
            BuildOutcome::NonZeroExit { code } => Some(code),
            _ => None,
        }
    }
}

/// Build one recipe. Never retries; every way of failing ends up in the
/// returned outcome.
pub fn build(recipe: &Recipe, config: &RunConfig, runner: &dyn CommandRunner) -> BuildResult {
    let invocation = Invocation::conan_create(recipe, config);

    if config.dry_run {
        debug!(recipe = %recipe.name, command = %invocation, "dry run, not spawning");
        return BuildResult::new(recipe, BuildOutcome::Simulated);
    }

    info!(recipe = %recipe.name, build_type = %config.build_type, "building recipe");

    let output = match runner.run(&invocation, !config.verbose) {
        Ok(output) => output,
        Err(err) => {
            warn!(recipe = %recipe.name, error = %err, "failed to launch {}", invocation.program);
            let cause = format!("{}: {}", invocation.program, err);
            return BuildResult::new(recipe, BuildOutcome::LaunchFailure { cause });
        }
    };

    debug!(recipe = %recipe.name, exit = ?output.exit, "process finished");

    let outcome = match output.exit {
        Exit::Code(0) => return BuildResult::new(recipe, BuildOutcome::Success),
        Exit::Code(code) => BuildOutcome::NonZeroExit { code },
        Exit::Signal(SIGINT) => return BuildResult::new(recipe, BuildOutcome::Interrupted),
        Exit::Signal(signal) => BuildOutcome::LaunchFailure {
            cause: format!("{} terminated by signal {}", invocation.program, signal),
        },
    };

    BuildResult {
        recipe: recipe.clone(),
        outcome,
        captured_output: output.diagnostics(),
    }
}

/// Counters printed at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}, Sucesso: {}, Falha: {}",
            self.total, self.succeeded, self.failed
        )?;
        if self.skipped > 0 {
            write!(f, ", Ignoradas: {}", self.skipped)?;
        }
        Ok(())
    }
}

/// All results of a run, in discovery order
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub results: Vec<BuildResult>,
}

impl BuildReport {
    /// Recipes that did not build, skipped ones included
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded()).count()
    }

    pub fn summary(&self) -> BuildSummary {
        let mut summary = BuildSummary {
            total: self.results.len(),
            ..Default::default()
        };
        for result in &self.results {
            match result.outcome {
                BuildOutcome::Success | BuildOutcome::Simulated => summary.succeeded += 1,
                BuildOutcome::Skipped => summary.skipped += 1,
                _ => summary.failed += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Build of '{recipe}' interrupted by user")]
    Interrupted { recipe: String },
}

/// Progress hooks of [`run_all`]. Every method defaults to doing nothing.
pub trait Reporter {
    fn discovered(&self, _root: &Path, _recipes: &[Recipe]) {}
    fn started(&self, _recipe: &Recipe, _invocation: &Invocation, _config: &RunConfig) {}
    fn finished(&self, _result: &BuildResult) {}
    fn summary(&self, _summary: &BuildSummary) {}
}

/// Discover every recipe under `config.root` and build them one by one
pub fn run_all(
    config: &RunConfig,
    runner: &dyn CommandRunner,
    reporter: &dyn Reporter,
) -> Result<BuildReport, RunError> {
    let recipes = recipe::discover(&config.root, &config.manifest)?;
    reporter.discovered(&config.root, &recipes);

    let mut report = BuildReport {
        results: Vec::with_capacity(recipes.len()),
    };
    let mut failed = false;

    for recipe in &recipes {
        let result = if failed && config.fail_fast {
            debug!(recipe = %recipe.name, "skipping after earlier failure");
            BuildResult::new(recipe, BuildOutcome::Skipped)
        } else {
            let invocation = Invocation::conan_create(recipe, config);
            reporter.started(recipe, &invocation, config);
            build(recipe, config, runner)
        };

        if result.outcome == BuildOutcome::Interrupted {
            return Err(RunError::Interrupted {
                recipe: recipe.name.clone(),
            });
        }

        debug!(recipe = %recipe.name, exit_code = ?result.exit_code(), outcome = %result.outcome, "recorded result");
        failed |= !result.succeeded();
        reporter.finished(&result);
        report.results.push(result);
    }

    if !report.results.is_empty() {
        reporter.summary(&report.summary());
    }

    Ok(report)
}
