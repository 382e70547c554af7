#![deny(missing_docs)]

pub use clap::Parser;
use clap::Subcommand;

/// Version automatically generated from git
pub const VERSION: &str = git_version::git_version!(
    args = ["--tags", "--always", "--dirty=-modified"],
    fallback = "unknown"
);

/// A helper for solving programming contest problems locally
#[derive(Parser, Debug)]
#[command(author, version = VERSION)]
pub struct App {
    /// Sets the level of verbosity
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disables color for verdicts
    #[arg(short = 'w', long, global = true)]
    pub no_color: bool,

    /// What to do
    #[command(subcommand)]
    pub command: Cmd,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Initializes a contest directory
    #[command(name = "i")]
    Init {
        /// Contest URL, or a bare name for an offline contest
        url: String,
        /// Problem IDs
        #[arg(required = true)]
        problems: Vec<String>,
    },

    /// Builds a problem
    #[command(name = "b")]
    Build {
        /// Problem directory or source file
        problem: String,
        /// Uses the optimized compile command
        #[arg(short = 'O', long)]
        opt: bool,
    },

    /// Builds a problem and runs it with the terminal attached
    #[command(name = "r")]
    Run {
        /// Problem directory or source file
        problem: String,
        /// Uses the optimized compile command
        #[arg(short = 'O', long)]
        opt: bool,
    },

    /// Downloads sample cases
    #[command(name = "d")]
    Download {
        /// Problem directories
        #[arg(required = true)]
        problems: Vec<String>,
    },

    /// Builds a problem and runs it against its test cases
    #[command(name = "t")]
    Test {
        /// Problem directory or source file
        problem: String,
        /// Uses the optimized compile command
        #[arg(short = 'O', long)]
        opt: bool,
    },

    /// Bundles and submits a problem
    #[command(name = "s")]
    Submit {
        /// Problem directory or source file
        problem: String,
        /// Copies the bundled source to the clipboard
        #[arg(short = 'c', long)]
        clip: bool,
    },

    /// Prints the judge URL of a problem
    #[command(name = "u")]
    Url {
        /// Problem directory or source file
        problem: String,
    },
}
