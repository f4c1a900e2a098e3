//! Utilities module - Console output helpers

use std::io::IsTerminal;

use clap::ValueEnum;
use colored::*;

use crate::core::config::RULE_WIDTH;

/// When to colour the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// `auto` colours only a terminal, and never when `NO_COLOR` is set
    pub fn enabled(self, is_terminal: bool, no_color: bool) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => is_terminal && !no_color,
        }
    }
}

/// Fix the colour mode for the rest of the process. Called once from `main`
/// before anything is printed.
pub fn init_color(choice: ColorChoice) {
    let enabled = choice.enabled(
        std::io::stdout().is_terminal(),
        std::env::var_os("NO_COLOR").is_some(),
    );
    colored::control::set_override(enabled);
}

/// `=====` separator line
pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Print a step message
pub fn print_step(message: &str) {
    println!("   {} {}", "→".bright_blue(), message);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("   {} {}", "✓".bright_green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("   {} {}", "✗".bright_red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("   {} {}", "⚠".bright_yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("   {} {}", "ℹ".bright_cyan(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_follows_terminal_and_no_color() {
        assert!(ColorChoice::Auto.enabled(true, false));
        assert!(!ColorChoice::Auto.enabled(false, false));
        assert!(!ColorChoice::Auto.enabled(true, true));
    }

    #[test]
    fn explicit_choices_win() {
        assert!(ColorChoice::Always.enabled(false, true));
        assert!(!ColorChoice::Never.enabled(true, false));
    }

    #[test]
    fn rule_width() {
        assert_eq!(rule().len(), 80);
        assert!(rule().chars().all(|c| c == '='));
    }
}
