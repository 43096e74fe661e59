//! Gantry CLI library.
//!
//! Argument definitions, `gantry.toml` loading and the handlers behind the
//! `gantry` binary.

pub mod cli;
pub mod config;

pub use config::{CONFIG_FILE_NAME, GantryConfig};
