//! Generator dispatch
//!
//! A build request names exactly one generator. Every request first gets the
//! shared node setup and, when package.json declares it, the custom build
//! script; then the generator-specific steps run.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::Config;
use crate::error::BuildError;

use super::context::{quote, quote_path, toolchain_contexts, BuildEnvironment, Shell, ShellContext, Toolchain};
use super::detect::{detect_manifests, DetectedManifests};
use super::finalize::{move_into_output, remove_path};
use super::install::{install_jekyll, run_custom_script, setup_node, setup_ruby};

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Za-z][0-9A-Za-z._-]*$").unwrap());

/// Static site generator selected for a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Generator {
    /// Only the package.json build script
    Script,
    /// Jekyll, with extra YAML appended to the site's `_config.yml`
    Jekyll { config: String },
    /// Hugo at the given release; empty means the configured default
    Hugo { version: String },
    /// Plain files moved into the output directory
    Static,
}

impl Generator {
    pub fn name(&self) -> &'static str {
        match self {
            Generator::Script => "script",
            Generator::Jekyll { .. } => "jekyll",
            Generator::Hugo { .. } => "hugo",
            Generator::Static => "static",
        }
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a single build needs to know about the site
#[derive(Debug, Clone, Serialize)]
pub struct BuildRequest {
    pub branch: String,
    pub owner: String,
    pub repository: String,
    pub site_prefix: String,
    pub base_url: String,
    pub generator: Generator,
}

impl BuildRequest {
    /// Variables exported to the custom script and generator commands
    pub fn environment(&self) -> BuildEnvironment {
        [
            ("BRANCH", &self.branch),
            ("OWNER", &self.owner),
            ("REPOSITORY", &self.repository),
            ("SITE_PREFIX", &self.site_prefix),
            ("BASEURL", &self.base_url),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

/// Downloads release assets
pub trait AssetFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), BuildError>;
}

/// Blocking HTTP download
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpFetcher;

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), BuildError> {
        tracing::info!("Fetching {}", url);

        let download_err = |error: String| BuildError::Download {
            url: url.to_string(),
            error,
        };

        let response = reqwest::blocking::get(url).map_err(|e| download_err(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(download_err(format!("HTTP {}", status)));
        }

        let bytes = response.bytes().map_err(|e| download_err(e.to_string()))?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::File::create(dest)?.write_all(&bytes)?;

        tracing::info!("Downloaded {} bytes to {}", bytes.len(), dest.display());
        Ok(())
    }
}

/// Append the per-build Jekyll settings to the site's config file
///
/// The file is created when missing.
pub fn append_jekyll_config(
    path: &Path,
    base_url: &str,
    branch: &str,
    extra: &str,
) -> Result<(), BuildError> {
    tracing::info!("Updating Jekyll config in {}", path.display());

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    write!(file, "\nbaseurl: {}\nbranch: {}\n{}", base_url, branch, extra)?;
    Ok(())
}

/// Runs build requests against the configured clone directory
pub struct Builder<'a> {
    config: &'a Config,
    fetcher: &'a dyn AssetFetcher,
}

impl<'a> Builder<'a> {
    pub fn new(config: &'a Config, fetcher: &'a dyn AssetFetcher) -> Self {
        Self { config, fetcher }
    }

    /// Run the shared node steps and then the requested generator
    ///
    /// # Errors
    /// * `BuildError::CommandFailed` - Any required step exits non-zero
    /// * `BuildError::OutputDirExists` - Static build into an existing output
    pub fn build(&self, shell: &mut Shell<'_>, request: &BuildRequest) -> Result<(), BuildError> {
        let clone_dir = self.config.paths.clone_dir();
        let manifests = detect_manifests(&clone_dir, self.config);

        tracing::info!(
            generator = %request.generator,
            "Building {}/{} ({})",
            request.owner,
            request.repository,
            request.branch
        );

        setup_node(shell, self.config, &manifests)?;
        run_custom_script(shell, self.config, &manifests)?;

        match &request.generator {
            Generator::Script => Ok(()),
            Generator::Jekyll { config } => self.build_jekyll(shell, &manifests, request, config),
            Generator::Hugo { version } => self.build_hugo(shell, &manifests, request, version),
            Generator::Static => self.build_static(),
        }
    }

    fn node_contexts(&self, manifests: &DetectedManifests) -> Result<Vec<ShellContext>, BuildError> {
        if !manifests.has_package_json() {
            return Ok(Vec::new());
        }
        toolchain_contexts(
            Toolchain::Node,
            self.config,
            manifests.node_version().as_deref(),
            [],
        )
    }

    fn build_jekyll(
        &self,
        shell: &mut Shell<'_>,
        manifests: &DetectedManifests,
        request: &BuildRequest,
        extra_config: &str,
    ) -> Result<(), BuildError> {
        setup_ruby(shell, self.config, manifests)?;

        let clone_dir = self.config.paths.clone_dir();
        append_jekyll_config(
            &clone_dir.join(&self.config.ruby.jekyll_config),
            &request.base_url,
            &request.branch,
            extra_config,
        )?;

        let ruby = toolchain_contexts(
            Toolchain::Ruby,
            self.config,
            manifests.ruby_version().as_deref(),
            [ShellContext::Cd(clone_dir)],
        )?;
        let mut scope = shell.enter(self.node_contexts(manifests)?.into_iter().chain(ruby));

        let jekyll = install_jekyll(&mut scope, manifests)?;
        if let Some(version) = scope.probe(&format!("{} -v", jekyll)) {
            tracing::info!("Building using Jekyll version: {}", version);
        }

        scope.run_with_env(
            &format!(
                "{} build --destination {}",
                jekyll,
                quote(&self.config.paths.site_build_dir)
            ),
            &request.environment(),
        )?;
        Ok(())
    }

    fn build_hugo(
        &self,
        shell: &mut Shell<'_>,
        manifests: &DetectedManifests,
        request: &BuildRequest,
        version: &str,
    ) -> Result<(), BuildError> {
        let version = if version.is_empty() {
            self.config.hugo.default_version.as_str()
        } else {
            version
        };
        if !VERSION_RE.is_match(version) {
            return Err(BuildError::InvalidInput {
                field: "hugo version".to_string(),
                value: version.to_string(),
            });
        }

        tracing::info!("Downloading and installing hugo version {}", version);
        let package = self.config.paths.working_dir().join("hugo.deb");
        self.fetcher
            .fetch(&self.config.hugo.release_url_for(version), &package)?;
        shell.run(&format!("dpkg -i {}", quote_path(&package)))?;

        if let Some(installed) = shell.probe("hugo version") {
            tracing::info!("hugo version: {}", installed);
        }

        tracing::info!("Building site with hugo");
        let mut scope = shell.enter(
            self.node_contexts(manifests)?
                .into_iter()
                .chain([ShellContext::Cd(self.config.paths.clone_dir())]),
        );

        let mut command = format!(
            "hugo --source . --destination {}",
            quote(&self.config.paths.site_build_dir)
        );
        if !request.base_url.is_empty() {
            command.push_str(&format!(" --baseUrl {}", quote(&request.base_url)));
        }

        scope.run_with_env(&command, &request.environment())?;
        Ok(())
    }

    fn build_static(&self) -> Result<(), BuildError> {
        self.config.paths.validate()?;
        let clone_dir = self.config.paths.clone_dir();

        tracing::info!("Cleaning repository");
        remove_path(&clone_dir.join(".git"))?;

        move_into_output(&clone_dir, &self.config.paths.site_build_path())?;
        Ok(())
    }
}
