//! Configuration model for sitebuilder
//!
//! Every fixed path and toolchain location lives here so that build
//! components receive it explicitly instead of reading process-wide state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::BuildError;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Clone, working and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Shell used to run every build command
    #[serde(default)]
    pub shell: ShellConfig,

    /// Node/nvm settings
    #[serde(default)]
    pub node: NodeConfig,

    /// Ruby/RVM and Jekyll settings
    #[serde(default)]
    pub ruby: RubyConfig,

    /// Hugo release settings
    #[serde(default)]
    pub hugo: HugoConfig,

    /// Repository fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Default headers merged under the repository's header rules
    #[serde(default)]
    pub headers: HeadersConfig,
}

/// Filesystem locations used by a build
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Where the external repository is cloned
    #[serde(default = "default_clone_dir")]
    pub clone_dir: String,

    /// Scratch directory for downloads
    #[serde(default = "default_working_dir")]
    pub working_dir: String,

    /// Name of the output directory, created inside the clone directory
    #[serde(default = "default_site_build_dir")]
    pub site_build_dir: String,
}

fn default_clone_dir() -> String {
    "/tmp/site_repo".to_string()
}

fn default_working_dir() -> String {
    "/tmp".to_string()
}

fn default_site_build_dir() -> String {
    "_site".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            clone_dir: default_clone_dir(),
            working_dir: default_working_dir(),
            site_build_dir: default_site_build_dir(),
        }
    }
}

impl PathsConfig {
    pub fn clone_dir(&self) -> PathBuf {
        PathBuf::from(&self.clone_dir)
    }

    pub fn working_dir(&self) -> PathBuf {
        PathBuf::from(&self.working_dir)
    }

    /// Absolute path of the output directory
    pub fn site_build_path(&self) -> PathBuf {
        self.clone_dir().join(&self.site_build_dir)
    }

    /// Reject output names that would escape the clone directory or nest
    /// below one of its entries
    pub fn validate(&self) -> Result<(), BuildError> {
        let mut components = Path::new(&self.site_build_dir).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(BuildError::Config(format!(
                "paths.site_build_dir must be a single directory name, got '{}'",
                self.site_build_dir
            ))),
        }
    }
}

/// Shell invocation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShellConfig {
    /// Shell program; must understand `source` and `&&`
    #[serde(default = "default_shell_program")]
    pub program: String,

    /// Ambient variables explicitly composed into every subprocess
    #[serde(default = "default_passthrough_env")]
    pub passthrough_env: Vec<String>,
}

fn default_shell_program() -> String {
    "bash".to_string()
}

fn default_passthrough_env() -> Vec<String> {
    ["PATH", "HOME", "NVM_DIR", "LANG"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: default_shell_program(),
            passthrough_env: default_passthrough_env(),
        }
    }
}

/// Node toolchain configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// nvm installation root; falls back to `$NVM_DIR` when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nvm_dir: Option<String>,

    /// package.json script that runs before every build
    #[serde(default = "default_custom_script")]
    pub custom_script: String,
}

fn default_custom_script() -> String {
    "federalist".to_string()
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            nvm_dir: None,
            custom_script: default_custom_script(),
        }
    }
}

impl NodeConfig {
    /// Path of `nvm.sh`, resolved lazily so builds without a package.json
    /// never require nvm.
    pub fn nvm_script(&self) -> Result<PathBuf, BuildError> {
        let dir = match &self.nvm_dir {
            Some(dir) if !dir.is_empty() => dir.clone(),
            _ => std::env::var("NVM_DIR").map_err(|_| {
                BuildError::Config("NVM_DIR is not set and node.nvm_dir is not configured".to_string())
            })?,
        };
        Ok(PathBuf::from(dir).join("nvm.sh"))
    }
}

/// Ruby toolchain configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RubyConfig {
    /// RVM initialization script
    #[serde(default = "default_rvm_script")]
    pub rvm_script: String,

    /// Jekyll configuration file, relative to the clone directory
    #[serde(default = "default_jekyll_config")]
    pub jekyll_config: String,
}

fn default_rvm_script() -> String {
    "/usr/local/rvm/scripts/rvm".to_string()
}

fn default_jekyll_config() -> String {
    "_config.yml".to_string()
}

impl Default for RubyConfig {
    fn default() -> Self {
        Self {
            rvm_script: default_rvm_script(),
            jekyll_config: default_jekyll_config(),
        }
    }
}

/// Hugo release download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HugoConfig {
    /// Version installed when the request does not name one
    #[serde(default = "default_hugo_version")]
    pub default_version: String,

    /// Release asset URL; `{version}` is replaced with the requested version
    #[serde(default = "default_release_url")]
    pub release_url: String,
}

fn default_hugo_version() -> String {
    "0.23".to_string()
}

fn default_release_url() -> String {
    "https://github.com/gohugoio/hugo/releases/download/v{version}/hugo_{version}_Linux-64bit.deb"
        .to_string()
}

impl Default for HugoConfig {
    fn default() -> Self {
        Self {
            default_version: default_hugo_version(),
            release_url: default_release_url(),
        }
    }
}

impl HugoConfig {
    pub fn release_url_for(&self, version: &str) -> String {
        self.release_url.replace("{version}", version)
    }
}

/// Repository fetch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// Host (and optional path) repositories are cloned from
    #[serde(default = "default_repo_base_url")]
    pub repo_base_url: String,
}

fn default_repo_base_url() -> String {
    "github.com".to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            repo_base_url: default_repo_base_url(),
        }
    }
}

/// Default response headers
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HeadersConfig {
    #[serde(default)]
    pub defaults: BTreeMap<String, String>,
}
