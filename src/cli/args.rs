//! CLI argument parsing using clap.
//!
//! Contains the Cli struct, Commands enum, and all subcommand enums.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Cross-reference index for Java source trees
#[derive(Parser, Debug)]
#[command(
    name = "codexref",
    version = env!("CARGO_PKG_VERSION"),
    about = "Cross-reference index for Java source trees",
    long_about = "Resolve type and method references across a Java project and query them.",
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up .codexref directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Index every Java file under a directory
    Index {
        /// Directory to index (defaults to the configured project root)
        #[arg(value_name = "DIR")]
        path: Option<PathBuf>,

        /// Number of threads to use (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Query the index
    Retrieve {
        /// Print results as JSON
        #[arg(long, global = true)]
        json: bool,

        #[command(subcommand)]
        query: RetrieveQuery,
    },
}

#[derive(Subcommand, Debug)]
pub enum RetrieveQuery {
    /// Show every usage of a class or method
    #[command(
        after_help = "Examples:\n  codexref retrieve references q.Foo\n  codexref retrieve references Foo.bar\n  codexref retrieve references 'Foo.<init>'"
    )]
    References {
        /// Qualified or simple class name, optionally followed by `.method`
        name: String,
    },

    /// Show the declaration referenced at a byte offset
    Definition {
        /// Path as recorded in the index
        file: String,
        /// Byte offset into the file
        offset: u32,
    },

    /// List every usage found in a file
    Usages {
        /// Path as recorded in the index
        file: String,
    },

    /// Show a class with its members
    Class {
        /// Qualified or simple class name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_index_and_retrieve() {
        let cli = Cli::parse_from(["codexref", "index", "src", "--threads", "1"]);
        assert!(matches!(
            cli.command,
            Commands::Index { path: Some(_), threads: Some(1) }
        ));

        let cli = Cli::parse_from([
            "codexref",
            "retrieve",
            "definition",
            "p/A.java",
            "42",
            "--json",
        ]);
        match cli.command {
            Commands::Retrieve {
                json,
                query: RetrieveQuery::Definition { file, offset },
            } => {
                assert!(json);
                assert_eq!(file, "p/A.java");
                assert_eq!(offset, 42);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
