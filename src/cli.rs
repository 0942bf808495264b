use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Print the tool-use prompt for a catalog
    Render {
        /// JSON file with the tool descriptors
        #[arg(short, long)]
        catalog: PathBuf,
    },

    /// Parse model output and print the tool call as JSON
    Parse {
        /// JSON file with the tool descriptors
        #[arg(short, long)]
        catalog: PathBuf,

        /// File with the model output (reads stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Fail if more than one tool call is present
        #[arg(long)]
        reject_trailing: bool,
    },
}

/// Define the application arguments
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub mode: Mode,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Args {
    pub fn parse() -> Self {
        <Args as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_render_mode() {
        let args = Args::try_parse_from(["test", "render", "--catalog", "tools.json"])
            .expect("Failed to parse render args");

        assert_eq!(args.verbose, 0);
        match args.mode {
            Mode::Render { catalog } => assert_eq!(catalog, PathBuf::from("tools.json")),
            _ => panic!("Expected render mode"),
        }
    }

    #[test]
    fn test_parse_mode_defaults() {
        let args = Args::try_parse_from(["test", "parse", "-c", "tools.json"])
            .expect("Failed to parse parse args");

        match args.mode {
            Mode::Parse {
                catalog,
                input,
                reject_trailing,
            } => {
                assert_eq!(catalog, PathBuf::from("tools.json"));
                assert!(input.is_none());
                assert!(!reject_trailing);
            }
            _ => panic!("Expected parse mode"),
        }
    }

    #[test]
    fn test_verbose_flag_counting() {
        let args = Args::try_parse_from(["test", "-vv", "render", "-c", "tools.json"])
            .expect("Failed to parse verbose args");
        assert_eq!(args.verbose, 2);

        let args = Args::try_parse_from(["test", "parse", "-c", "t.json", "-v", "--reject-trailing"])
            .expect("Failed to parse verbose args");
        assert_eq!(args.verbose, 1);
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Args::try_parse_from(["test"]).is_err());
    }
}
