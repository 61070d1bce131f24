//! CLI command definitions for the `plugdeploy` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` runs the HTTP API;
//! the other commands drive the same deployment pipeline directly.

pub mod plugin;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Deploy model plugins and their graph schemas.
#[derive(Parser)]
#[command(name = "plugdeploy", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config.toml (defaults to ~/.plugdeploy/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "PLUGDEPLOY_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(long, short)]
        port: Option<u16>,

        /// Host to bind to (overrides config).
        #[arg(long)]
        host: Option<String>,
    },

    /// Deploy every plugin directory below a local directory.
    Deploy {
        /// Directory whose children are plugin directories.
        dir: PathBuf,
    },

    /// List deployed plugins.
    #[command(alias = "ls")]
    List,

    /// Download a deployed plugin's files into a directory.
    Fetch {
        /// Plugin name.
        name: String,

        /// Target directory; files land under `<dir>/<name>/`.
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Delete deployed plugins by name.
    #[command(alias = "rm")]
    Delete {
        /// Plugin names to delete.
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["plugdeploy", "serve", "--port", "9000", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { port, host } => {
                assert_eq!(port, Some(9000));
                assert!(host.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_delete_requires_names() {
        assert!(Cli::try_parse_from(["plugdeploy", "delete"]).is_err());

        let cli = Cli::try_parse_from(["plugdeploy", "rm", "alpha", "beta", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Delete { names } => assert_eq!(names, vec!["alpha", "beta"]),
            _ => panic!("expected delete"),
        }
    }

    #[test]
    fn test_parse_fetch_defaults_to_current_dir() {
        let cli = Cli::try_parse_from(["plugdeploy", "fetch", "alpha"]).unwrap();
        match cli.command {
            Commands::Fetch { name, dir } => {
                assert_eq!(name, "alpha");
                assert_eq!(dir, PathBuf::from("."));
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_parse_global_config_path() {
        let cli =
            Cli::try_parse_from(["plugdeploy", "--config", "/etc/plugdeploy.toml", "list"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/plugdeploy.toml")));
        assert!(matches!(cli.command, Commands::List));
    }
}
