//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing and subcommand handlers.

mod args;
mod commands;

pub use args::{Args, Command, ConfigAction, EncodeArgs};
pub use commands::{
    ctrlc_received, encode_stream, handle_config_action, run_encode, setup_ctrlc_handler,
    show_info, CliError, EncodeSummary,
};
