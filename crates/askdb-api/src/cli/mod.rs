//! CLI command definitions for the `askdb` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod chat;
pub mod schema;

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

/// Ask questions about a SQL database in plain language.
#[derive(Parser)]
#[command(name = "askdb", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, env = "ASKDB_CONFIG", default_value = "askdb.toml")]
    pub config: PathBuf,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Run `load_env` before parsing `args`, so `env = ...` fallbacks such as
    /// `ASKDB_CONFIG` see values that came from a `.env` file.
    pub fn parse_with_env<E, I, T>(load_env: impl FnOnce() -> E, args: I) -> (Self, E)
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let loaded = load_env();
        (Self::parse_from(args), loaded)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer one question and exit.
    Ask {
        /// The question, e.g. "how many users signed up last week?".
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Prompt with retrieved schema chunks instead of the whole schema.
        #[arg(long)]
        retrieval: bool,

        /// Print the SQL that produced the answer.
        #[arg(long)]
        show_sql: bool,
    },

    /// Start an interactive multi-turn session.
    Chat {
        /// Prompt with retrieved schema chunks instead of the whole schema.
        #[arg(long)]
        retrieval: bool,
    },

    /// Start the REST API server.
    Serve {
        /// Host to bind to (defaults to `[server] host`).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to `[server] port`).
        #[arg(short, long)]
        port: Option<u16>,

        /// Prompt with retrieved schema chunks instead of the whole schema.
        #[arg(long)]
        retrieval: bool,
    },

    /// Print the introspected database schema.
    Schema {
        /// Include types, keys and indexes (the text used for retrieval).
        #[arg(long)]
        detailed: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// A steady-ticking cyan spinner.
pub(crate) fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_joins_words() {
        let cli =
            Cli::try_parse_from(["askdb", "ask", "how", "many", "users?", "--show-sql"]).unwrap();
        match cli.command {
            Commands::Ask {
                question,
                retrieval,
                show_sql,
            } => {
                assert_eq!(question.join(" "), "how many users?");
                assert!(!retrieval);
                assert!(show_sql);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_dotenv_config_path_reaches_parser() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "ASKDB_CONFIG=from-dotenv.toml\n").unwrap();

        let (cli, loaded) = Cli::parse_with_env(
            || dotenvy::from_path_override(&env_file),
            ["askdb", "schema"],
        );
        assert!(loaded.is_ok());
        assert_eq!(cli.config, PathBuf::from("from-dotenv.toml"));

        let explicit = Cli::try_parse_from(["askdb", "--config", "cli.toml", "schema"]).unwrap();
        assert_eq!(explicit.config, PathBuf::from("cli.toml"));
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["askdb", "-vv", "serve", "--port", "9000", "--retrieval"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve {
                host,
                port,
                retrieval,
            } => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
                assert!(retrieval);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["askdb", "ask"]).is_err());
    }
}
