//! Site repository configuration (`federalist.json`)
//!
//! Only the `headers` key is read. It holds an ordered list of single-entry
//! objects mapping a path pattern to the headers served for matching files:
//!
//! ```json
//! {
//!   "headers": [
//!     { "/*.html": { "cache-control": "no-cache" } },
//!     { "/*": { "cache-control": "max-age=60" } }
//!   ]
//! }
//! ```
//!
//! The first matching pattern wins; its headers are layered over the
//! configured defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::BuildError;

pub const SITE_CONFIG_FILE: &str = "federalist.json";

pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Default, Deserialize)]
struct RawSiteConfig {
    #[serde(default)]
    headers: Vec<BTreeMap<String, Headers>>,
}

/// One path pattern and the headers it applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRule {
    pub pattern: String,
    pub headers: Headers,
}

/// Parsed site configuration plus the defaults it is layered over
#[derive(Debug, Clone, Default)]
pub struct RepoConfig {
    rules: Vec<HeaderRule>,
    defaults: Headers,
}

impl RepoConfig {
    pub fn new(rules: Vec<HeaderRule>, defaults: Headers) -> Self {
        Self { rules, defaults }
    }

    /// Parse `federalist.json` contents
    pub fn parse(source: &str, origin: &str, defaults: Headers) -> Result<Self, BuildError> {
        let invalid = |error: String| BuildError::SiteConfig {
            path: origin.to_string(),
            error,
        };

        let raw: RawSiteConfig = serde_json::from_str(source).map_err(|e| invalid(e.to_string()))?;

        let rules = raw
            .headers
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| {
                let mut entries = entry.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((pattern, headers)), None) => Ok(HeaderRule { pattern, headers }),
                    _ => Err(invalid(format!(
                        "headers[{}] must map exactly one path pattern",
                        idx
                    ))),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(rules, defaults))
    }

    /// Load `federalist.json` from a site directory
    ///
    /// A site without the file gets only the defaults.
    pub fn load(site_dir: &Path, defaults: Headers) -> Result<Self, BuildError> {
        let path = site_dir.join(SITE_CONFIG_FILE);
        if !path.is_file() {
            tracing::debug!("No {} in {}", SITE_CONFIG_FILE, site_dir.display());
            return Ok(Self::new(Vec::new(), defaults));
        }

        let source = std::fs::read_to_string(&path)?;
        Self::parse(&source, &path.display().to_string(), defaults)
    }

    pub fn rules(&self) -> &[HeaderRule] {
        &self.rules
    }

    /// Headers to serve for a file path
    ///
    /// Keys from the matching rule are trimmed and lowercased, values are
    /// trimmed.
    pub fn headers_for_path(&self, path: &str) -> Headers {
        let mut resolved = self.defaults.clone();

        if let Some(rule) = self.rules.iter().find(|rule| match_path(&rule.pattern, path)) {
            tracing::debug!("{} matched header pattern {}", path, rule.pattern);
            for (key, value) in &rule.headers {
                resolved.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }

        resolved
    }
}

/// Match a file path against a header pattern
///
/// `*` as a whole segment matches the rest of the path, `*.ext` matches when
/// the path's last extension is `ext`, and `:name` matches any single
/// segment.
pub fn match_path(pattern: &str, path: &str) -> bool {
    let pattern = pattern.strip_prefix('/').unwrap_or(pattern);
    let path = path.strip_prefix('/').unwrap_or(path);

    let pattern_parts: Vec<&str> = pattern.split('/').collect();
    let path_parts: Vec<&str> = path.split('/').collect();

    for (idx, part) in pattern_parts.iter().enumerate() {
        if *part == "*" {
            return true;
        }

        if part.starts_with(':') {
            continue;
        }

        if path_parts.len() <= idx {
            return false;
        }

        if part.starts_with("*.") {
            let wanted = part.rsplit('.').next();
            let actual = path_parts.last().and_then(|last| last.rsplit('.').next());
            return wanted == actual;
        }

        if path_parts[idx] != *part {
            return false;
        }
    }

    path_parts.len() <= pattern_parts.len()
}
