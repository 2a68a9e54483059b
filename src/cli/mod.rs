//! CLI module for sitebuilder
//!
//! Provides command-line interface with the following subcommands:
//! - `build` - Build the cloned site (script, jekyll, hugo, static)
//! - `fetch` - Clone the site repository
//! - `detect` - Show manifests and version pins
//! - `headers` - Resolve headers for a path
//! - `config` - Show configuration

pub mod commands;

pub use commands::{BuildCommand, Cli, Commands};
