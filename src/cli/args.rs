//! CLI argument definitions using clap
//!
//! Commands:
//! - shardscan uid new [--config <path>] [--timestamp <rfc3339>] [--extra <part>]... <content>
//! - shardscan uid parse [--max-extra-parts <n>] <uid>
//! - shardscan holes check --config <path> --field <name> --start <yyyyMMdd> --end <yyyyMMdd> (--value <v> | --lower <l> --upper <u>)
//! - shardscan normalize --config <path>   (expression JSON on stdin)

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// shardscan - shard-aware query execution kernel tools
#[derive(Parser, Debug)]
#[command(name = "shardscan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate or decode record identifiers
    Uid {
        #[command(subcommand)]
        action: UidAction,
    },

    /// Query known index holes
    Holes {
        #[command(subcommand)]
        action: HolesAction,
    },

    /// Rewrite string literals on untyped fields in an expression read from stdin
    Normalize {
        /// Path to configuration file
        #[arg(long, default_value = "./shardscan.json")]
        config: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum UidAction {
    /// Generate an identifier for the given content
    New {
        /// Path to configuration file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Ingest timestamp (RFC 3339)
        #[arg(long)]
        timestamp: Option<String>,

        /// Extra components appended after the base
        #[arg(long = "extra")]
        extras: Vec<String>,

        /// Raw record content
        content: String,
    },

    /// Decode an identifier
    Parse {
        /// Extras to keep: -1 all, 0 none, n at most n
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        max_extra_parts: i32,

        /// Identifier string
        uid: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum HolesAction {
    /// Check whether the index can be trusted for a value or range
    Check(HolesCheckArgs),
}

#[derive(Args, Debug)]
pub struct HolesCheckArgs {
    /// Path to configuration file naming the holes file
    #[arg(long, default_value = "./shardscan.json")]
    pub config: PathBuf,

    /// Holes file, overriding the configuration
    #[arg(long)]
    pub holes: Option<PathBuf>,

    /// Field name
    #[arg(long)]
    pub field: String,

    /// First query date (yyyyMMdd)
    #[arg(long)]
    pub start: String,

    /// Last query date (yyyyMMdd)
    #[arg(long)]
    pub end: String,

    /// Normalized value for an equality lookup
    #[arg(long, conflicts_with_all = ["lower", "upper"], required_unless_present_all = ["lower", "upper"])]
    pub value: Option<String>,

    /// Lower bound of a range lookup
    #[arg(long, requires = "upper")]
    pub lower: Option<String>,

    /// Upper bound of a range lookup
    #[arg(long, requires = "lower")]
    pub upper: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
