//! CLI command definitions using clap
//!
//! Defines all CLI subcommands and their arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::build::{BuildRequest, FetchRequest, Generator};

/// Static site build runner.
///
/// Clones a site repository and builds it with its package.json script,
/// Jekyll, Hugo, or as plain static files.
#[derive(Parser, Debug)]
#[command(name = "sitebuilder")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (overrides default XDG paths)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the cloned site with one generator
    #[command(subcommand)]
    Build(BuildCommand),

    /// Clone a site repository into the clone directory
    Fetch(FetchArgs),

    /// Show which manifests and version pins the clone directory has
    Detect(DetectArgs),

    /// Resolve the headers served for a path
    Headers(HeadersArgs),

    /// Show resolved configuration
    Config(ConfigArgs),
}

/// Generators for the `build` subcommand
#[derive(Subcommand, Debug)]
pub enum BuildCommand {
    /// Run only the package.json build script
    Script(SiteArgs),

    /// Build with Jekyll
    Jekyll(JekyllArgs),

    /// Build with Hugo
    Hugo(HugoArgs),

    /// Publish the repository files as-is
    Static(SiteArgs),
}

/// Site identity shared by every generator
#[derive(Args, Debug, Clone)]
pub struct SiteArgs {
    /// Branch being built
    #[arg(long)]
    pub branch: String,

    /// Repository owner
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repository: String,

    /// Path prefix the site is published under
    #[arg(long, default_value = "")]
    pub site_prefix: String,

    /// Base URL handed to the generator
    #[arg(long, default_value = "")]
    pub base_url: String,
}

/// Arguments for `build jekyll`
#[derive(Args, Debug)]
pub struct JekyllArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Raw YAML appended to _config.yml
    #[arg(long, default_value = "")]
    pub config_text: String,
}

/// Arguments for `build hugo`
#[derive(Args, Debug)]
pub struct HugoArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Hugo release to install (defaults to hugo.default_version)
    #[arg(long, default_value = "")]
    pub hugo_version: String,
}

impl BuildCommand {
    /// Convert parsed arguments into a build request
    pub fn into_request(self) -> BuildRequest {
        let (site, generator) = match self {
            BuildCommand::Script(site) => (site, Generator::Script),
            BuildCommand::Jekyll(args) => (
                args.site,
                Generator::Jekyll {
                    config: args.config_text,
                },
            ),
            BuildCommand::Hugo(args) => (
                args.site,
                Generator::Hugo {
                    version: args.hugo_version,
                },
            ),
            BuildCommand::Static(site) => (site, Generator::Static),
        };

        BuildRequest {
            branch: site.branch,
            owner: site.owner,
            repository: site.repository,
            site_prefix: site.site_prefix,
            base_url: site.base_url,
            generator,
        }
    }
}

/// Arguments for the `fetch` subcommand
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Repository owner
    #[arg(long)]
    pub owner: String,

    /// Repository name
    #[arg(long)]
    pub repository: String,

    /// Branch to clone
    #[arg(long)]
    pub branch: String,

    /// Token for private repositories
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

impl From<FetchArgs> for FetchRequest {
    fn from(args: FetchArgs) -> Self {
        FetchRequest {
            owner: args.owner,
            repository: args.repository,
            branch: args.branch,
            token: args.github_token,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON output
    Json,
    /// Plain text
    Plain,
}

/// Arguments for the `detect` subcommand
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Directory to inspect (defaults to the configured clone directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the `headers` subcommand
#[derive(Args, Debug)]
pub struct HeadersArgs {
    /// File path to resolve, e.g. /index.html
    #[arg(long)]
    pub path: String,

    /// Site directory holding federalist.json (defaults to the clone directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the `config` subcommand
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}
