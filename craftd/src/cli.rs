//! CLI command definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// craftd - supervised crafting, gathering, and fishing
#[derive(Parser)]
#[command(
    name = "craftd",
    about = "Supervisor for coarse crafting, gathering, and fishing executors",
    version,
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Craft an item end to end against the simulated executors
    Craft {
        /// Item id to craft
        #[arg(value_name = "ITEM_ID")]
        item_id: u32,

        /// How many to craft
        #[arg(short, long, default_value = "1")]
        quantity: u32,

        /// Extra units added to every craft target
        #[arg(short, long, default_value = "0")]
        buffer: u32,

        /// Halt on missing materials and gather failures instead of continuing
        #[arg(long)]
        strict: bool,

        /// Solver preference applied to craft tasks
        #[arg(long)]
        solver: Option<String>,
    },

    /// Run a fishing session against the simulated world
    Fish {
        /// Stop after this many catches (default: run until Ctrl+C)
        #[arg(short = 'n', long)]
        catches: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_craft_args() {
        let cli = Cli::parse_from(["craftd", "craft", "11", "--quantity", "2", "--strict"]);
        match cli.command {
            Command::Craft {
                item_id,
                quantity,
                buffer,
                strict,
                solver,
            } => {
                assert_eq!(item_id, 11);
                assert_eq!(quantity, 2);
                assert_eq!(buffer, 0);
                assert!(strict);
                assert!(solver.is_none());
            }
            _ => panic!("expected craft command"),
        }
    }

    #[test]
    fn test_fish_args() {
        let cli = Cli::parse_from(["craftd", "fish", "-n", "5"]);
        match cli.command {
            Command::Fish { catches } => assert_eq!(catches, Some(5)),
            _ => panic!("expected fish command"),
        }
    }
}
