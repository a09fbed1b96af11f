//! CLI subcommand implementations.

pub mod analyze;
pub mod normalize;
mod util;
