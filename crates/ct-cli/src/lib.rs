//! Combat trace CLI library.
//!
//! This crate provides the CLI interface for combat trace analysis.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
