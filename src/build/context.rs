//! Shell contexts and the scoped shell
//!
//! A build step runs inside a stack of contexts (sourcing a version
//! manager, selecting a pinned version, changing directory). Each context
//! becomes an `&&`-joined prefix of the command line. Contexts are entered
//! through [`Shell::enter`], which returns a guard that pops exactly what it
//! pushed when dropped, including on early return through `?`.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{suggest_fix, BuildError};
use crate::executor::{CommandRunner, ExecResult, Invocation};

/// One activation wrapped around a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellContext {
    /// `source <script>`
    Source(PathBuf),
    /// A raw command prefix such as `nvm use v8`
    Prefix(String),
    /// `cd <dir>`
    Cd(PathBuf),
}

impl fmt::Display for ShellContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellContext::Source(path) => write!(f, "source {}", quote_path(path)),
            ShellContext::Prefix(cmd) => write!(f, "{}", cmd),
            ShellContext::Cd(path) => write!(f, "cd {}", quote_path(path)),
        }
    }
}

/// Toolchains managed through a version manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toolchain {
    /// nvm-managed node
    Node,
    /// RVM-managed ruby
    Ruby,
}

impl Toolchain {
    /// Script sourced to activate the version manager
    pub fn init_script(&self, config: &Config) -> Result<PathBuf, BuildError> {
        match self {
            Toolchain::Node => config.node.nvm_script(),
            Toolchain::Ruby => Ok(PathBuf::from(&config.ruby.rvm_script)),
        }
    }

    /// Activation selecting a pinned version
    pub fn use_version(&self, version: &str) -> ShellContext {
        match self {
            Toolchain::Node => ShellContext::Prefix(format!("nvm use {}", quote(version))),
            Toolchain::Ruby => ShellContext::Prefix(format!("rvm use {}", quote(version))),
        }
    }

    /// Command installing a pinned version
    pub fn install_version(&self, version: &str) -> String {
        match self {
            Toolchain::Node => format!("nvm install {}", quote(version)),
            Toolchain::Ruby => format!("rvm install {}", quote(version)),
        }
    }
}

/// Compose the contexts for running a command with a toolchain
///
/// The version manager is always sourced first. A pinned version adds a
/// "use" activation right after it; without a pin the manager's default
/// version is used. Caller-supplied contexts follow.
pub fn toolchain_contexts(
    toolchain: Toolchain,
    config: &Config,
    pin: Option<&str>,
    extra: impl IntoIterator<Item = ShellContext>,
) -> Result<Vec<ShellContext>, BuildError> {
    let mut contexts = vec![ShellContext::Source(toolchain.init_script(config)?)];

    if let Some(version) = pin {
        contexts.push(toolchain.use_version(version));
    }

    contexts.extend(extra);
    Ok(contexts)
}

/// Variables handed to generator subprocesses
pub type BuildEnvironment = BTreeMap<String, String>;

/// A command runner plus the stack of active contexts
pub struct Shell<'r> {
    runner: &'r mut dyn CommandRunner,
    contexts: Vec<ShellContext>,
    secrets: Vec<String>,
}

impl<'r> Shell<'r> {
    pub fn new(runner: &'r mut dyn CommandRunner) -> Self {
        Self {
            runner,
            contexts: Vec::new(),
            secrets: Vec::new(),
        }
    }

    /// Mask a value in every logged or reported command line
    pub fn add_secret(&mut self, secret: impl Into<String>) {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
    }

    /// Currently active contexts, outermost first
    pub fn contexts(&self) -> &[ShellContext] {
        &self.contexts
    }

    /// Push contexts for the lifetime of the returned guard
    pub fn enter(&mut self, contexts: impl IntoIterator<Item = ShellContext>) -> Scope<'_, 'r> {
        let depth = self.contexts.len();
        self.contexts.extend(contexts);
        Scope { shell: self, depth }
    }

    /// Full command line with all active contexts applied
    pub fn compose(&self, command: &str) -> String {
        self.contexts
            .iter()
            .map(ToString::to_string)
            .chain(std::iter::once(command.to_string()))
            .collect::<Vec<_>>()
            .join(" && ")
    }

    fn redact(&self, text: &str) -> String {
        self.secrets
            .iter()
            .fold(text.to_string(), |acc, secret| acc.replace(secret.as_str(), "***"))
    }

    /// Run a build step, streaming its output
    ///
    /// # Errors
    /// * `BuildError::CommandFailed` - If the command exits non-zero
    pub fn run(&mut self, command: &str) -> Result<ExecResult, BuildError> {
        self.run_with_env(command, &BuildEnvironment::new())
    }

    /// Run a build step with extra environment variables
    pub fn run_with_env(
        &mut self,
        command: &str,
        env: &BuildEnvironment,
    ) -> Result<ExecResult, BuildError> {
        let invocation = Invocation::new(self.compose(command)).with_env(env);
        self.execute(invocation)
    }

    /// Run a diagnostic command and return its trimmed stdout
    ///
    /// Failures are logged and never abort the build.
    pub fn probe(&mut self, command: &str) -> Option<String> {
        let invocation = Invocation::new(self.compose(command)).captured();
        match self.execute(invocation) {
            Ok(result) => Some(result.stdout.trim().to_string()),
            Err(e) => {
                tracing::warn!("Diagnostic '{}' failed: {}", self.redact(command), e);
                None
            }
        }
    }

    /// Run a command whose failure is tolerated
    pub fn attempt(&mut self, command: &str) -> bool {
        match self.run(command) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("'{}' failed, continuing: {}", self.redact(command), e);
                false
            }
        }
    }

    fn execute(&mut self, invocation: Invocation) -> Result<ExecResult, BuildError> {
        let shown = self.redact(&invocation.command);
        tracing::debug!("Running: {}", shown);

        let result = self.runner.run(&invocation).map_err(|e| match e {
            BuildError::SpawnFailed { command, error } => BuildError::SpawnFailed {
                command,
                error: self.redact(&error),
            },
            other => other,
        })?;

        if result.success {
            return Ok(result);
        }

        let stderr = self.redact(&result.stderr);
        Err(BuildError::CommandFailed {
            suggestion: suggest_fix(&shown, &stderr),
            command: shown,
            exit_code: result.exit_code,
            stderr,
        })
    }
}

/// Guard returned by [`Shell::enter`]
pub struct Scope<'s, 'r> {
    shell: &'s mut Shell<'r>,
    depth: usize,
}

impl<'r> Deref for Scope<'_, 'r> {
    type Target = Shell<'r>;

    fn deref(&self) -> &Self::Target {
        self.shell
    }
}

impl<'r> DerefMut for Scope<'_, 'r> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.shell
    }
}

impl Drop for Scope<'_, '_> {
    fn drop(&mut self) {
        self.shell.contexts.truncate(self.depth);
    }
}

/// Quote a word for a POSIX shell
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));

    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

pub(crate) fn quote_path(path: &Path) -> String {
    quote(&path.to_string_lossy())
}
