use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "engojee")]
#[command(about = "Manage auto-reply rules and control the engojee automation engine")]
#[command(long_about = "engojee - keyword-triggered auto-replies

Define rules that pair trigger keywords with candidate replies, then hand
them to the automation engine and watch what it does.

QUICK START:
  engojee rules add --name Crypto --keywords btc,eth --reply gm --reply wagmi
  engojee rules list
  engojee service start
  engojee service watch

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

Data lives in ~/.engojee (override with ENGOJEE_HOME).")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Defaults to `general.default_output` from config.yaml, or 'pretty'.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage auto-reply rules
    ///
    /// Rules pair comma-separated keywords with newline-separated replies.
    /// They are stored locally and sent to the engine when it starts.
    #[command(alias = "r")]
    Rules(RulesArgs),

    /// Control the automation engine
    ///
    /// Start and stop the engine, poll its status, open the accessibility
    /// settings it needs, or follow its activity log.
    #[command(alias = "s")]
    Service(ServiceArgs),

    /// Generate shell completions
    ///
    /// # Examples
    ///
    ///   engojee completions zsh > ~/.zfunc/_engojee
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Rules command arguments.
#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommands,
}

/// Rules subcommands.
#[derive(Subcommand)]
pub enum RulesCommands {
    /// List all rules
    #[command(alias = "ls")]
    List,

    /// Show a rule with its keywords and replies
    Show {
        /// Rule ID
        id: String,
    },

    /// Create a rule
    Add {
        /// Display name
        #[arg(long, short = 'n')]
        name: String,

        /// Comma-separated trigger keywords
        #[arg(long, short = 'k')]
        keywords: String,

        /// Candidate reply (repeat for several)
        #[arg(long = "reply", short = 'r', required = true)]
        replies: Vec<String>,
    },

    /// Edit a rule
    ///
    /// Only the given fields change. Passing --reply replaces all replies.
    Edit {
        /// Rule ID
        id: String,

        /// New display name
        #[arg(long, short = 'n')]
        name: Option<String>,

        /// New comma-separated keywords
        #[arg(long, short = 'k')]
        keywords: Option<String>,

        /// New candidate reply (repeat for several)
        #[arg(long = "reply", short = 'r')]
        replies: Vec<String>,
    },

    /// Delete a rule
    #[command(alias = "rm")]
    Delete {
        /// Rule ID
        id: String,
    },
}

/// Service command arguments.
#[derive(Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommands,
}

/// Service subcommands.
#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceCommands {
    /// Send all rules to the engine and start it
    Start,

    /// Stop the engine
    Stop,

    /// Show the engine status
    Status,

    /// Open the accessibility settings the engine needs
    Settings,

    /// Follow engine events until the engine closes its stream
    Watch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_replies() {
        let cli = Cli::try_parse_from([
            "engojee", "rules", "add", "-n", "Crypto", "-k", "btc,eth", "-r", "gm", "-r", "wagmi",
        ])
        .unwrap();

        match cli.command {
            Commands::Rules(RulesArgs {
                command: RulesCommands::Add { name, keywords, replies },
            }) => {
                assert_eq!(name, "Crypto");
                assert_eq!(keywords, "btc,eth");
                assert_eq!(replies, vec!["gm", "wagmi"]);
            }
            _ => panic!("expected rules add"),
        }
        assert_eq!(cli.output, None);
    }

    #[test]
    fn test_add_requires_reply() {
        assert!(Cli::try_parse_from(["engojee", "rules", "add", "-n", "a", "-k", "b"]).is_err());
    }

    #[test]
    fn test_global_output_flag() {
        let cli = Cli::try_parse_from(["engojee", "service", "status", "--output", "json"]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }
}
