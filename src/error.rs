//! Error types for sitebuilder
//!
//! Provides structured error types with suggestions for common build failures.

use serde::Serialize;
use thiserror::Error;

/// Main error type for build operations
#[derive(Error, Debug)]
pub enum BuildError {
    /// A subprocess exited non-zero
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
        suggestion: Option<String>,
    },

    /// Failed to spawn the shell
    #[error("Failed to spawn command: {command}")]
    SpawnFailed { command: String, error: String },

    /// The output directory is already present
    #[error("Output directory already exists: {path}")]
    OutputDirExists { path: String },

    /// Release asset download failed
    #[error("Download failed for {url}: {error}")]
    Download { url: String, error: String },

    /// Caller-supplied value rejected before reaching a shell
    #[error("Invalid {field}: {value}")]
    InvalidInput { field: String, value: String },

    /// federalist.json in the site repository could not be parsed
    #[error("Invalid site config {path}: {error}")]
    SiteConfig { path: String, error: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Exit code the process should terminate with for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::CommandFailed {
                exit_code: Some(code),
                ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Serializable error info for structured output
#[derive(Debug, Serialize, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl ErrorInfo {
    fn plain(message: String, error_type: &str, suggestion: Option<String>) -> Self {
        Self {
            message,
            error_type: error_type.to_string(),
            suggestion,
            exit_code: None,
            stderr: None,
        }
    }
}

impl From<&BuildError> for ErrorInfo {
    fn from(err: &BuildError) -> Self {
        match err {
            BuildError::CommandFailed {
                command,
                exit_code,
                stderr,
                suggestion,
            } => ErrorInfo {
                message: format!("Command failed: {}", command),
                error_type: "command_failed".to_string(),
                suggestion: suggestion.clone(),
                exit_code: *exit_code,
                stderr: if stderr.is_empty() {
                    None
                } else {
                    Some(stderr.clone())
                },
            },
            BuildError::SpawnFailed { command, error } => ErrorInfo::plain(
                format!("Failed to spawn command: {}", command),
                "spawn_failed",
                Some(format!("Check that the shell is installed: {}", error)),
            ),
            BuildError::OutputDirExists { path } => ErrorInfo::plain(
                format!("Output directory already exists: {}", path),
                "output_dir_exists",
                Some("Start from a fresh clone; builds never merge into an existing output".to_string()),
            ),
            BuildError::Download { url, error } => ErrorInfo::plain(
                format!("Download failed for {}: {}", url, error),
                "download_failed",
                Some("Check the requested generator version and network connectivity".to_string()),
            ),
            BuildError::InvalidInput { field, .. } => ErrorInfo::plain(
                err.to_string(),
                "invalid_input",
                Some(format!("Use only letters, digits, '.', '_', '-' in the {}", field)),
            ),
            BuildError::SiteConfig { .. } => ErrorInfo::plain(
                err.to_string(),
                "site_config_error",
                Some("Fix the JSON syntax of federalist.json in the site repository".to_string()),
            ),
            BuildError::Config(msg) => ErrorInfo::plain(
                format!("Configuration error: {}", msg),
                "config_error",
                Some("Check your sitebuilder configuration file".to_string()),
            ),
            BuildError::Io(e) => ErrorInfo::plain(format!("IO error: {}", e), "io_error", None),
        }
    }
}

/// Suggest fixes for common build failure patterns
pub fn suggest_fix(command: &str, stderr: &str) -> Option<String> {
    if stderr.contains("nvm: command not found") || stderr.contains("nvm.sh: No such file") {
        return Some("nvm is not installed or NVM_DIR points to the wrong directory.".to_string());
    }

    if stderr.contains("rvm: command not found") || stderr.contains("scripts/rvm: No such file") {
        return Some("RVM is not installed at the configured ruby.rvm_script path.".to_string());
    }

    if stderr.contains("Missing script") || stderr.contains("missing script") {
        return Some("The npm script is not defined in package.json.".to_string());
    }

    if stderr.contains("Permission denied") || stderr.contains("are you root?") {
        if command.contains("dpkg") {
            return Some("Installing the hugo package requires root privileges.".to_string());
        }
        return Some(
            "Permission denied. Check file permissions or run with appropriate access.".to_string(),
        );
    }

    if stderr.contains("Could not find gem") || stderr.contains("Gemfile.lock") {
        return Some("Bundler could not resolve the Gemfile. Try updating Gemfile.lock.".to_string());
    }

    if stderr.contains("Remote branch") && stderr.contains("not found") {
        return Some("The requested branch does not exist in the repository.".to_string());
    }

    if stderr.contains("command not found") || stderr.contains("not found") {
        for tool in ["bundle", "jekyll", "hugo", "npm", "node", "git"] {
            if command.contains(tool) {
                return Some(format!("'{}' command not found. Check PATH and the toolchain setup.", tool));
            }
        }
        return Some("Required command not found. Check PATH and dependencies.".to_string());
    }

    None
}
