//! CLI module - command-line interface
//!
//! Contains the REPL, command parsing, and outcome rendering.

pub mod commands;
pub mod repl;

pub use repl::{format_outcome, run_cancellable, Repl};
