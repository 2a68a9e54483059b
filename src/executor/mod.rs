//! Command execution module
//!
//! Provides blocking command execution with:
//! - Output capture and truncation
//! - Explicit environment composition
//! - Working directory control
//! - A `CommandRunner` seam for build steps

pub mod runner;
pub mod traits;

pub use runner::*;
pub use traits::*;
