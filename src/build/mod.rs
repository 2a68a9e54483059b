//! Site build pipeline
//!
//! Steps, in order:
//! - fetch: shallow clone of the site repository
//! - detect: marker files in the clone directory
//! - install: node and ruby toolchains, dependencies, custom script
//! - dispatch: the selected generator
//! - finalize: filesystem moves for static sites

pub mod context;
pub mod detect;
pub mod dispatch;
pub mod fetch;
pub mod finalize;
pub mod install;

pub use context::{quote, BuildEnvironment, Scope, Shell, ShellContext, Toolchain};
pub use detect::{detect_manifests, has_custom_script, DetectedManifests};
pub use dispatch::{append_jekyll_config, AssetFetcher, BuildRequest, Builder, Generator, HttpFetcher};
pub use fetch::{fetch_repo, fetch_url, FetchRequest};
pub use finalize::{move_into_output, remove_path};
