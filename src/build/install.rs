//! Toolchain setup and dependency installation
//!
//! Every step is conditional on the marker files found in the clone
//! directory; a missing manifest means the step is skipped, while a failing
//! install command aborts the build.

use crate::config::Config;
use crate::error::BuildError;

use super::context::{quote, toolchain_contexts, Shell, ShellContext, Toolchain};
use super::detect::DetectedManifests;

/// Install production npm dependencies when package.json is present
///
/// A version pinned by `.nvmrc` is installed first and then selected for
/// every later node command.
pub fn setup_node(
    shell: &mut Shell<'_>,
    config: &Config,
    manifests: &DetectedManifests,
) -> Result<(), BuildError> {
    if !manifests.has_package_json() {
        tracing::info!("No package.json found, skipping node setup");
        return Ok(());
    }

    let pin = manifests.node_version();

    if let Some(ref version) = pin {
        tracing::info!("Using node version {} specified in .nvmrc", version);
        let mut nvm = shell.enter([ShellContext::Source(Toolchain::Node.init_script(config)?)]);
        nvm.run(&Toolchain::Node.install_version(version))?;
    }

    let mut node = shell.enter(toolchain_contexts(
        Toolchain::Node,
        config,
        pin.as_deref(),
        [ShellContext::Cd(config.paths.clone_dir())],
    )?);

    if let Some(version) = node.probe("node --version") {
        tracing::info!("Node version: {}", version);
    }
    if let Some(version) = node.probe("npm --version") {
        tracing::info!("NPM version: {}", version);
    }

    tracing::info!("Installing production dependencies in package.json");
    node.run("npm install --production")?;

    Ok(())
}

/// Run the custom build script from package.json, if declared
///
/// Returns whether the script ran.
pub fn run_custom_script(
    shell: &mut Shell<'_>,
    config: &Config,
    manifests: &DetectedManifests,
) -> Result<bool, BuildError> {
    let script = &config.node.custom_script;
    if !manifests.has_script(script) {
        tracing::debug!("No '{}' script in package.json", script);
        return Ok(false);
    }

    let mut node = shell.enter(toolchain_contexts(
        Toolchain::Node,
        config,
        manifests.node_version().as_deref(),
        [ShellContext::Cd(config.paths.clone_dir())],
    )?);

    tracing::info!("Running {} build script in package.json", script);
    node.run(&format!("npm run {}", quote(script)))?;

    Ok(true)
}

/// Prepare ruby through RVM
///
/// A version pinned by `.ruby-version` is installed on a best-effort basis;
/// the active interpreter is reported either way.
pub fn setup_ruby(
    shell: &mut Shell<'_>,
    config: &Config,
    manifests: &DetectedManifests,
) -> Result<(), BuildError> {
    let mut rvm = shell.enter([ShellContext::Source(Toolchain::Ruby.init_script(config)?)]);

    if let Some(version) = manifests.ruby_version() {
        tracing::info!("Using ruby version {} specified in .ruby-version", version);
        rvm.attempt(&Toolchain::Ruby.install_version(&version));
    }

    if let Some(version) = rvm.probe("ruby -v") {
        tracing::info!("Ruby version: {}", version);
    }

    Ok(())
}

/// Install Jekyll and return the command that invokes it
///
/// With a Gemfile the locked dependencies are installed through bundler and
/// Jekyll runs under `bundle exec`.
pub fn install_jekyll(
    shell: &mut Shell<'_>,
    manifests: &DetectedManifests,
) -> Result<&'static str, BuildError> {
    if manifests.has_gemfile() {
        tracing::info!("Setting up bundler");
        shell.run("gem install bundler")?;
        tracing::info!("Installing dependencies in Gemfile");
        shell.run("bundle install")?;
        Ok("bundle exec jekyll")
    } else {
        tracing::info!("Installing Jekyll");
        shell.run("gem install jekyll")?;
        Ok("jekyll")
    }
}
