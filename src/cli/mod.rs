//! CLI module for shardscan
//!
//! Provides command-line access to:
//! - uid new / uid parse: identifier generation and decoding
//! - holes check: index usability against known holes
//! - normalize: literal normalization of a JSON expression

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, HolesAction, HolesCheckArgs, UidAction};
pub use commands::{holes_check, normalize, run, run_command, uid_new, uid_parse};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
