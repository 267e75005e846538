//! Command implementations for engojee.
//!
//! This module contains the implementation of all CLI commands.

mod rules;
mod service;

pub use rules::rules;
pub use service::service;

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::Cli;

/// Generate a completion script for the given shell.
#[must_use]
pub fn completions(shell: Shell) -> String {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, "engojee", &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_mention_subcommands() {
        let script = completions(Shell::Bash);
        assert!(script.contains("engojee"));
        assert!(script.contains("rules"));
        assert!(script.contains("service"));
    }
}
