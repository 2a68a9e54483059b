//! sitebuilder - Static site build runner
//!
//! Clones a site repository and builds it with one of four generators:
//! - **Script** - the `federalist` script from package.json
//! - **Jekyll** - with bundler when a Gemfile is present
//! - **Hugo** - a pinned release downloaded and installed per build
//! - **Static** - repository files moved into the output directory
//!
//! ## Features
//!
//! - Node and ruby version pins from `.nvmrc` and `.ruby-version`
//! - Scoped shell contexts for nvm/RVM activation
//! - XDG-compliant layered configuration
//! - Header rules from the site's `federalist.json`

pub mod build;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod repo_config;

pub use build::{BuildRequest, Builder, Generator, Shell};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{BuildError, ErrorInfo};
pub use executor::{
    exec_command, exec_command_sync, exec_shell_command, CommandRunner, ExecOptions, ExecResult,
    Invocation, ShellRunner,
};
pub use repo_config::RepoConfig;
