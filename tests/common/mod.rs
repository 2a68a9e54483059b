//! Common test utilities for sitebuilder tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use sitebuilder::config::Config;
use sitebuilder::error::BuildError;
use sitebuilder::executor::{CommandRunner, ExecResult, Invocation};
use tempfile::TempDir;

/// Records every invocation; commands containing a failure pattern exit
/// with the paired code
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub invocations: Vec<Invocation>,
    failures: Vec<(String, i32)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, pattern: &str, exit_code: i32) -> Self {
        self.failures.push((pattern.to_string(), exit_code));
        self
    }

    /// Recorded command lines, in order
    pub fn commands(&self) -> Vec<&str> {
        self.invocations.iter().map(|i| i.command.as_str()).collect()
    }

    /// Position of the first command ending with `suffix`
    pub fn position(&self, suffix: &str) -> Option<usize> {
        self.invocations.iter().position(|i| i.command.ends_with(suffix))
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ExecResult, BuildError> {
        self.invocations.push(invocation.clone());

        let failure = self
            .failures
            .iter()
            .find(|(pattern, _)| invocation.command.contains(pattern.as_str()));

        Ok(match failure {
            Some((pattern, code)) => ExecResult::failed(*code, format!("{} failed", pattern)),
            None => ExecResult::ok(""),
        })
    }
}

/// Creates a temporary site checkout with the given files
pub fn create_site_project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write site file");
    }
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Configuration pointing at a temporary clone and working directory
pub fn config_for(clone_dir: &Path, working_dir: &Path) -> Config {
    let mut config = Config::default();
    config.paths.clone_dir = clone_dir.to_string_lossy().to_string();
    config.paths.working_dir = working_dir.to_string_lossy().to_string();
    config.node.nvm_dir = Some("/opt/nvm".to_string());
    config.ruby.rvm_script = "/opt/rvm/scripts/rvm".to_string();
    config
}

/// package.json declaring the custom build script
pub const PACKAGE_JSON_WITH_SCRIPT: &str = r#"{
  "name": "site",
  "scripts": {
    "federalist": "node build.js"
  }
}"#;

/// package.json without a scripts section
pub const PACKAGE_JSON_PLAIN: &str = r#"{
  "name": "site",
  "dependencies": {}
}"#;

/// federalist.json with header rules
pub const SITE_CONFIG: &str = r#"{
  "headers": [
    { "/*.html": { "Cache-Control": "no-cache" } },
    { "/*": { "cache-control": "max-age=60" } }
  ]
}"#;
