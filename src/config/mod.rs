//! Configuration module for sitebuilder
//!
//! Provides XDG-compliant layered configuration loading with
//! path expansion for toolchain and directory settings.

pub mod interpolate;
pub mod loader;
pub mod model;

pub use interpolate::interpolate_config;
pub use loader::{config_paths, find_config_files, load_config};
pub use model::*;
