//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ct_core::EventType;

/// Combat trace analyzer.
///
/// Fabricates despawn events for fixed-lifetime summons and attributes
/// delayed spell damage to the state at cast time.
#[derive(Debug, Parser)]
#[command(name = "ct", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Insert synthetic despawn events and print the trace as JSONL.
    Normalize {
        /// Trace file, one JSON event per line.
        trace: PathBuf,

        /// Fail on summons of unknown entity kinds.
        #[arg(long)]
        strict: bool,

        /// Append despawns that fall after the last event instead of dropping them.
        #[arg(long)]
        append_tail: bool,

        /// Only print events of this type (e.g. `despawn`).
        #[arg(long)]
        only: Option<EventType>,
    },

    /// Normalize a trace and print cast/buff statistics.
    Analyze {
        /// Trace file, one JSON event per line.
        trace: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Player actor ID (overrides config).
        #[arg(long)]
        player: Option<u64>,
    },
}
