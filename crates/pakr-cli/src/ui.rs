//! Console output for commands.
//!
//! Progress goes to stdout, problems to stderr. `--quiet` keeps only the
//! latter.

use crossterm::style::Stylize;

const SUCCESS_ICON: &str = "✓";
const WARNING_ICON: &str = "!";
const ERROR_ICON: &str = "✗";

/// A cheap, cloneable handle for user-facing messages.
#[derive(Debug, Clone, Default)]
pub struct Output {
    quiet: bool,
}

impl Output {
    /// Create an output handle; `quiet` silences info and success messages.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    /// Prints an informational message to the console.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.dark_grey());
        }
    }

    /// Prints a success message to the console.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", SUCCESS_ICON.green(), msg.green());
        }
    }

    /// Prints a warning message to stderr.
    pub fn warning(&self, msg: &str) {
        eprintln!("{} {}", WARNING_ICON.yellow(), msg.yellow());
    }

    /// Prints an error message to stderr.
    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", ERROR_ICON.red(), msg.red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_creation() {
        let output = Output::new(false);
        output.info("test");
        output.success("done");
    }

    #[test]
    fn test_output_quiet_clone() {
        let output = Output::new(true);
        let copy = output.clone();
        output.info("silenced");
        copy.warning("still shown");
    }
}
