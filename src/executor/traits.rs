//! The seam between build steps and real processes
//!
//! Build steps hand a fully composed shell command line to a
//! [`CommandRunner`]; the production implementation runs it through the
//! configured shell, tests substitute a recorder.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::ShellConfig;
use crate::error::BuildError;

use super::runner::{exec_command_sync, ExecOptions, ExecResult};

/// A single shell invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Command line, including any `&&`-joined context prefixes
    pub command: String,
    /// Variables composed for this command on top of the pass-through set
    pub env: BTreeMap<String, String>,
    /// Capture stdout (diagnostics) instead of streaming it (build steps)
    pub capture_output: bool,
}

impl Invocation {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: BTreeMap::new(),
            capture_output: false,
        }
    }

    pub fn with_env(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture_output = true;
        self
    }
}

/// Runs composed shell commands
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run the invocation to completion
    ///
    /// Non-zero exits are reported through `ExecResult`, not as errors.
    ///
    /// # Errors
    /// * `BuildError::SpawnFailed` - If the shell could not be started
    fn run(&mut self, invocation: &Invocation) -> Result<ExecResult, BuildError>;
}

/// Runs invocations as `<shell> -c <command>`
pub struct ShellRunner {
    program: PathBuf,
    passthrough: BTreeMap<String, String>,
    working_dir: Option<PathBuf>,
}

impl ShellRunner {
    /// Resolve the configured shell and snapshot the pass-through variables
    pub fn from_config(config: &ShellConfig) -> Result<Self, BuildError> {
        let program = which::which(&config.program).map_err(|e| BuildError::SpawnFailed {
            command: config.program.clone(),
            error: e.to_string(),
        })?;

        let passthrough = config
            .passthrough_env
            .iter()
            .filter_map(|name| std::env::var(name).ok().map(|value| (name.clone(), value)))
            .collect();

        Ok(Self {
            program,
            passthrough,
            working_dir: None,
        })
    }

    /// Directory the shell starts in
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn options_for(&self, invocation: &Invocation) -> ExecOptions {
        let mut options = if invocation.capture_output {
            ExecOptions::default()
        } else {
            ExecOptions::streaming()
        };
        options.working_dir = self.working_dir.clone();
        options
            .with_envs(self.passthrough.clone())
            .with_envs(invocation.env.clone())
    }
}

impl CommandRunner for ShellRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ExecResult, BuildError> {
        let options = self.options_for(invocation);
        let program = self.program.to_string_lossy();
        exec_command_sync(&program, &["-c", &invocation.command], &options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh_config() -> ShellConfig {
        ShellConfig {
            program: "sh".to_string(),
            passthrough_env: vec!["PATH".to_string()],
        }
    }

    #[test]
    fn test_invocation_builder() {
        let mut env = BTreeMap::new();
        env.insert("BRANCH".to_string(), "main".to_string());

        let inv = Invocation::new("hugo version").with_env(&env).captured();

        assert_eq!(inv.command, "hugo version");
        assert_eq!(inv.env.get("BRANCH"), Some(&"main".to_string()));
        assert!(inv.capture_output);
    }

    #[test]
    fn test_invocation_streams_by_default() {
        assert!(!Invocation::new("npm install").capture_output);
    }

    #[test]
    fn test_unknown_shell_is_spawn_failure() {
        let config = ShellConfig {
            program: "no-such-shell-12345".to_string(),
            passthrough_env: vec![],
        };

        match ShellRunner::from_config(&config) {
            Err(BuildError::SpawnFailed { command, .. }) => {
                assert_eq!(command, "no-such-shell-12345")
            }
            _ => panic!("Expected SpawnFailed"),
        }
    }

    #[test]
    fn test_options_compose_passthrough_and_invocation_env() {
        let Ok(runner) = ShellRunner::from_config(&sh_config()) else {
            eprintln!("Skipping test: sh not available");
            return;
        };

        let mut env = BTreeMap::new();
        env.insert("BASEURL".to_string(), "/preview".to_string());
        let options = runner.options_for(&Invocation::new("true").with_env(&env));

        assert!(options.env.contains_key("PATH"));
        assert_eq!(options.env.get("BASEURL"), Some(&"/preview".to_string()));
        assert!(!options.capture_output);
    }

    #[test]
    fn test_shell_runner_runs_command() {
        let Ok(runner) = ShellRunner::from_config(&sh_config()) else {
            eprintln!("Skipping test: sh not available");
            return;
        };
        let dir = tempfile::TempDir::new().unwrap();
        let mut runner = runner.in_dir(dir.path());

        let result = runner
            .run(&Invocation::new("touch made-here && echo done").captured())
            .unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("done"));
        assert!(dir.path().join("made-here").exists());
    }
}
