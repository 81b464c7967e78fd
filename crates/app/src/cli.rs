use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "reckon", version, about = "Categorise and reconcile bank statement exports")]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Categorise an HSBC credit card CSV export
    Credit {
        /// CSV statement export
        file: PathBuf,
    },
    /// Categorise a BOM offset account CSV export
    Current {
        /// CSV statement export
        file: PathBuf,
    },
    /// Categorise a NAB credit card CSV export
    Nab {
        /// CSV statement export
        file: PathBuf,
    },
    /// Re-categorise previously imported transactions
    Recat {
        /// Limit to one worksheet (default: all)
        #[arg(long, value_enum)]
        sheet: Option<TargetSheet>,
        /// Prompt for a category for each unmatched group
        #[arg(long)]
        interactive: bool,
    },
    /// Work with the category mapping
    Mapping {
        #[command(subcommand)]
        command: MappingCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum MappingCommand {
    /// Write the YAML ruleset to the mapping worksheet, keeping comments
    Push,
    /// Overwrite the YAML ruleset from the mapping worksheet
    Pull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetSheet {
    Credit,
    Offset,
}

impl TargetSheet {
    pub fn worksheet(self) -> &'static str {
        match self {
            TargetSheet::Credit => "credit",
            TargetSheet::Offset => "offset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_import_command() {
        let cli = Cli::parse_from(["reckon", "credit", "statement.csv"]);
        assert!(matches!(cli.command, Command::Credit { .. }));
        assert!(!cli.debug);
    }

    #[test]
    fn parses_recat_with_sheet() {
        let cli = Cli::parse_from(["reckon", "--debug", "recat", "--sheet", "offset"]);
        assert!(cli.debug);
        match cli.command {
            Command::Recat { sheet, interactive } => {
                assert_eq!(sheet, Some(TargetSheet::Offset));
                assert!(!interactive);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
