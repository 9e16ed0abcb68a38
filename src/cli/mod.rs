//! CLI module for Evently
//!
//! Command-line parsing for the `evently-server` binary. Uses clap for
//! argument parsing and owo-colors for terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Evently - event management backend
#[derive(Parser, Debug)]
#[command(
    name = "evently-server",
    version,
    about = "Evently - event management backend",
    long_about = "Sign up, log in, publish events and register for them.\n\n\
                  Run without arguments to start the server, \
                  or use 'init' to write a starter config.",
    after_help = "EXAMPLES:\n    \
                  evently-server init                  # Write evently.toml and .env.example\n    \
                  evently-server                       # Start the server with evently.toml\n    \
                  evently-server config --validate     # Check config and environment\n    \
                  evently-server --config my.toml      # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "evently.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Write a starter evently.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "8080")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Also check that referenced environment variables are usable
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["evently-server"]).expect("should parse");

        assert_eq!(cli.command, None);
        assert_eq!(cli.config, PathBuf::from("evently.toml"));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["evently-server", "config", "--validate", "-c", "x.toml"])
            .expect("should parse");

        assert_eq!(cli.command, Some(Commands::Config { validate: true }));
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn test_init_defaults() {
        let cli = Cli::try_parse_from(["evently-server", "init"]).expect("should parse");

        assert_eq!(
            cli.command,
            Some(Commands::Init {
                path: PathBuf::from("."),
                force: false,
                host: "127.0.0.1".to_string(),
                port: 8080,
            })
        );
    }
}
