//! Quarry CLI: search integration for generated entity projects.
//!
//! Provides `quarry setup` to enable search support, `quarry add` and
//! `quarry all` to make entities searchable, and `quarry generate` to write
//! the generated members and views.

#![warn(missing_docs)]

mod add;
mod generate;
mod root;
mod setup;

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter that overrides the flags.
const LOG_ENV: &str = "QUARRY_LOG";

/// Quarry: keeps generated search members and views in sync with entities.
#[derive(Parser, Debug)]
#[command(name = "quarry", version, about = "Quarry code generator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `quarry.toml`, or the project directory holding one.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enable search support for the project.
    Setup(SetupArgs),
    /// Make one entity searchable.
    Add(AddArgs),
    /// Make every concrete entity searchable.
    All,
    /// Write generated members and search views.
    Generate,
}

/// Arguments for the `quarry setup` subcommand.
#[derive(Parser, Debug)]
pub struct SetupArgs {
    /// Search node host; omit or pass `embedded` to run a local node.
    #[arg(long)]
    pub host: Option<String>,

    /// Search node port.
    #[arg(long, default_value_t = quarry_search::DEFAULT_PORT)]
    pub port: u16,
}

/// Arguments for the `quarry add` subcommand.
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Fully qualified name of the entity.
    #[arg(short = 't', long = "type")]
    pub type_name: String,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// The log filter the flags select when `QUARRY_LOG` is unset.
    fn default_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

fn init_logging(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(global.default_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    init_logging(&global);

    let result = match cli.command {
        Command::Setup(ref args) => setup::run(args, &global),
        Command::Add(ref args) => add::run(args, &global),
        Command::All => add::run_all(&global),
        Command::Generate => generate::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_setup_default() {
        let cli = Cli::parse_from(["quarry", "setup"]);
        match cli.command {
            Command::Setup(ref args) => {
                assert!(args.host.is_none());
                assert_eq!(args.port, 9300);
            }
            _ => panic!("expected Setup command"),
        }
    }

    #[test]
    fn parse_setup_with_args() {
        let cli = Cli::parse_from([
            "quarry",
            "setup",
            "--host",
            "search.example.com",
            "--port",
            "9301",
        ]);
        match cli.command {
            Command::Setup(ref args) => {
                assert_eq!(args.host.as_deref(), Some("search.example.com"));
                assert_eq!(args.port, 9301);
            }
            _ => panic!("expected Setup command"),
        }
    }

    #[test]
    fn parse_add() {
        let cli = Cli::parse_from(["quarry", "add", "--type", "com.example.Person"]);
        match cli.command {
            Command::Add(ref args) => assert_eq!(args.type_name, "com.example.Person"),
            _ => panic!("expected Add command"),
        }
    }

    #[test]
    fn add_requires_a_type() {
        assert!(Cli::try_parse_from(["quarry", "add"]).is_err());
    }

    #[test]
    fn parse_all_and_generate() {
        assert!(matches!(Cli::parse_from(["quarry", "all"]).command, Command::All));
        assert!(matches!(
            Cli::parse_from(["quarry", "generate"]).command,
            Command::Generate
        ));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["quarry", "--quiet", "--config", "demo", "generate"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("demo"));
    }

    #[test]
    fn filter_follows_flags() {
        let mut global = GlobalArgs {
            quiet: false,
            verbose: false,
            config: None,
        };
        assert_eq!(global.default_filter(), "info");
        global.verbose = true;
        assert_eq!(global.default_filter(), "debug");
        global.quiet = true;
        assert_eq!(global.default_filter(), "error");
    }
}
