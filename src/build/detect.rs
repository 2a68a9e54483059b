//! Marker-file detection in the clone directory
//!
//! Checks for:
//! - package.json (npm dependencies and the custom build script)
//! - .nvmrc (pinned node version)
//! - .ruby-version (pinned ruby version)
//! - Gemfile (bundler-managed Jekyll)
//! - _config.yml (Jekyll configuration)

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;

pub const PACKAGE_JSON: &str = "package.json";
pub const NVMRC: &str = ".nvmrc";
pub const RUBY_VERSION: &str = ".ruby-version";
pub const GEMFILE: &str = "Gemfile";

/// Snapshot of the marker files present in a clone directory
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DetectedManifests {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_json: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nvmrc: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruby_version: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemfile: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jekyll_config: Option<PathBuf>,
}

impl DetectedManifests {
    pub fn has_package_json(&self) -> bool {
        self.package_json.is_some()
    }

    pub fn has_gemfile(&self) -> bool {
        self.gemfile.is_some()
    }

    /// Node version pinned by `.nvmrc`
    pub fn node_version(&self) -> Option<String> {
        self.nvmrc.as_deref().and_then(read_pin)
    }

    /// Ruby version pinned by `.ruby-version`
    pub fn ruby_version(&self) -> Option<String> {
        self.ruby_version.as_deref().and_then(read_pin)
    }

    /// Whether package.json declares the named script
    pub fn has_script(&self, name: &str) -> bool {
        self.package_json
            .as_deref()
            .is_some_and(|path| has_custom_script(path, name))
    }
}

/// Detect marker files in the clone directory
pub fn detect_manifests(clone_dir: &Path, config: &Config) -> DetectedManifests {
    let found = |name: &str| {
        let path = clone_dir.join(name);
        path.is_file().then_some(path)
    };

    let manifests = DetectedManifests {
        package_json: found(PACKAGE_JSON),
        nvmrc: found(NVMRC),
        ruby_version: found(RUBY_VERSION),
        gemfile: found(GEMFILE),
        jekyll_config: found(&config.ruby.jekyll_config),
    };

    tracing::debug!(?manifests, "Detected manifests in {}", clone_dir.display());
    manifests
}

/// Check whether package.json defines `scripts.<name>`
///
/// Missing, unreadable or malformed manifests, and manifests without a
/// `scripts` section, all report `false`.
pub fn has_custom_script(manifest: &Path, name: &str) -> bool {
    let contents = match std::fs::read_to_string(manifest) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!("Cannot read {}: {}", manifest.display(), e);
            return false;
        }
    };

    let json: serde_json::Value = match serde_json::from_str(&contents) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Ignoring unparsable {}: {}", manifest.display(), e);
            return false;
        }
    };

    json.get("scripts")
        .and_then(|scripts| scripts.as_object())
        .is_some_and(|scripts| scripts.contains_key(name))
}

/// First non-empty line of a version-pin file
fn read_pin(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let version = contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string);

    if version.is_none() {
        tracing::warn!("{} is empty; using the default version", path.display());
    }
    version
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_detect_empty_directory() {
        let dir = TempDir::new().unwrap();

        let manifests = detect_manifests(dir.path(), &Config::default());

        assert_eq!(manifests, DetectedManifests::default());
        assert!(!manifests.has_package_json());
        assert!(!manifests.has_script("federalist"));
    }

    #[test]
    fn test_detect_all_markers() {
        let dir = TempDir::new().unwrap();
        for name in [PACKAGE_JSON, NVMRC, RUBY_VERSION, GEMFILE, "_config.yml"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let manifests = detect_manifests(dir.path(), &Config::default());

        assert_eq!(manifests.package_json, Some(dir.path().join(PACKAGE_JSON)));
        assert!(manifests.nvmrc.is_some());
        assert!(manifests.ruby_version.is_some());
        assert!(manifests.has_gemfile());
        assert!(manifests.jekyll_config.is_some());
    }

    #[test]
    fn test_detect_ignores_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(PACKAGE_JSON)).unwrap();

        let manifests = detect_manifests(dir.path(), &Config::default());

        assert!(!manifests.has_package_json());
    }

    #[test]
    fn test_has_custom_script_present() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join(PACKAGE_JSON);
        fs::write(&manifest, r#"{"scripts": {"federalist": "npm run build"}}"#).unwrap();

        assert!(has_custom_script(&manifest, "federalist"));
        assert!(!has_custom_script(&manifest, "build"));
    }

    #[test]
    fn test_has_custom_script_without_scripts_section() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join(PACKAGE_JSON);
        fs::write(&manifest, r#"{"name": "site", "dependencies": {}}"#).unwrap();

        assert!(!has_custom_script(&manifest, "federalist"));
    }

    #[test]
    fn test_has_custom_script_missing_or_malformed() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join(PACKAGE_JSON);

        assert!(!has_custom_script(&manifest, "federalist"));

        fs::write(&manifest, "{ not json").unwrap();
        assert!(!has_custom_script(&manifest, "federalist"));

        fs::write(&manifest, r#"{"scripts": ["federalist"]}"#).unwrap();
        assert!(!has_custom_script(&manifest, "federalist"));
    }

    #[test]
    fn test_pinned_versions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(NVMRC), "\n  v8.11.1  \n").unwrap();
        fs::write(dir.path().join(RUBY_VERSION), "2.5.1\nignored\n").unwrap();

        let manifests = detect_manifests(dir.path(), &Config::default());

        assert_eq!(manifests.node_version(), Some("v8.11.1".to_string()));
        assert_eq!(manifests.ruby_version(), Some("2.5.1".to_string()));
    }

    #[test]
    fn test_empty_pin_file_is_no_pin() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(NVMRC), "   \n").unwrap();

        let manifests = detect_manifests(dir.path(), &Config::default());

        assert!(manifests.nvmrc.is_some());
        assert_eq!(manifests.node_version(), None);
    }

    #[test]
    fn test_manifests_serialization_skips_missing() {
        let manifests = DetectedManifests {
            gemfile: Some(PathBuf::from("/repo/Gemfile")),
            ..Default::default()
        };

        let json = serde_json::to_string(&manifests).unwrap();
        assert!(json.contains("\"gemfile\":\"/repo/Gemfile\""));
        assert!(!json.contains("package_json"));
    }
}
