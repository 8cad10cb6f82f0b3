//! Settings come from a TOML file plus `LOGINGUARD__` environment overrides.
//! See `bin/settings_demo.rs` for a binary that loads and prints them.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
