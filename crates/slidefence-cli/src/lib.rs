#![forbid(unsafe_code)]

pub mod cli;
mod commands;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands, execute, run};
pub use error::{CliError, Result};
