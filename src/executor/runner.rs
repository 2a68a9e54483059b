//! Command execution
//!
//! Provides a unified interface for running commands with:
//! - Output capture (stdout/stderr) or streaming to the terminal
//! - Output truncation for large outputs
//! - An explicitly composed environment (no ambient inheritance)
//! - Working directory control

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::BuildError;

/// Maximum output size before truncation (in bytes)
const MAX_OUTPUT_SIZE: usize = 100_000; // 100KB

/// Truncation marker for large outputs
const TRUNCATION_MARKER: &str = "\n... [output truncated] ...\n";

/// Options for command execution
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Working directory for the command
    pub working_dir: Option<PathBuf>,
    /// Complete environment of the child process
    pub env: BTreeMap<String, String>,
    /// Capture stdout instead of streaming it; stderr is always kept
    pub capture_output: bool,
    /// Maximum output size before truncation
    pub max_output_size: usize,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            working_dir: None,
            env: BTreeMap::new(),
            capture_output: true,
            max_output_size: MAX_OUTPUT_SIZE,
        }
    }
}

impl ExecOptions {
    /// Create options with a working directory
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: Some(dir.into()),
            ..Default::default()
        }
    }

    /// Options that stream stdout/stderr to the terminal
    pub fn streaming() -> Self {
        Self {
            capture_output: false,
            ..Default::default()
        }
    }

    /// Add an environment variable
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add several environment variables
    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    /// Set maximum output size
    pub fn with_max_output(mut self, size: usize) -> Self {
        self.max_output_size = size;
        self
    }
}

/// Result of command execution
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code if available (None when killed by a signal)
    pub exit_code: Option<i32>,
    /// Standard output; empty when streamed
    pub stdout: String,
    /// Whether stdout was truncated
    pub stdout_truncated: bool,
    /// Standard error (may be truncated)
    pub stderr: String,
    /// Whether stderr was truncated
    pub stderr_truncated: bool,
    /// Duration of execution
    pub duration: Duration,
}

impl ExecResult {
    /// A successful result with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stdout_truncated: false,
            stderr: String::new(),
            stderr_truncated: false,
            duration: Duration::ZERO,
        }
    }

    /// A failed result with the given exit code and stderr
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stdout_truncated: false,
            stderr: stderr.into(),
            stderr_truncated: false,
            duration: Duration::ZERO,
        }
    }
}

/// Execute a command asynchronously
///
/// The child's environment is cleared and replaced by `options.env`.
///
/// # Errors
/// * `BuildError::SpawnFailed` - If the command couldn't be spawned
pub async fn exec_command(
    program: &str,
    args: &[&str],
    options: &ExecOptions,
) -> Result<ExecResult, BuildError> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.env_clear();
    cmd.envs(&options.env);
    cmd.stdin(Stdio::null());
    cmd.stdout(if options.capture_output {
        Stdio::piped()
    } else {
        Stdio::inherit()
    });
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);

    if let Some(ref dir) = options.working_dir {
        cmd.current_dir(dir);
    }

    // Callers log the redacted command line
    tracing::trace!("Spawning {} with {} argument(s)", program, args.len());

    let child = cmd.spawn().map_err(|e| BuildError::SpawnFailed {
        command: program.to_string(),
        error: e.to_string(),
    })?;

    let result = wait_for_output(child, options.max_output_size, !options.capture_output).await?;

    Ok(ExecResult {
        success: result.exit_code == Some(0),
        exit_code: result.exit_code,
        stdout: result.stdout,
        stdout_truncated: result.stdout_truncated,
        stderr: result.stderr,
        stderr_truncated: result.stderr_truncated,
        duration: start.elapsed(),
    })
}

/// Internal result from waiting for process output
struct WaitResult {
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
    stdout_truncated: bool,
    stderr_truncated: bool,
}

/// Wait for a child process and capture its output
async fn wait_for_output(
    mut child: tokio::process::Child,
    max_output_size: usize,
    echo_stderr: bool,
) -> Result<WaitResult, BuildError> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_handle = tokio::spawn(async move {
        match stdout {
            Some(stdout) => read_and_truncate(stdout, max_output_size, false).await,
            None => (String::new(), false),
        }
    });

    let stderr_handle = tokio::spawn(async move {
        match stderr {
            Some(stderr) => read_and_truncate(stderr, max_output_size, echo_stderr).await,
            None => (String::new(), false),
        }
    });

    let status = child.wait().await.map_err(BuildError::Io)?;

    let (stdout, stdout_truncated) = stdout_handle
        .await
        .map_err(|e| BuildError::Io(std::io::Error::other(format!("stdout task failed: {}", e))))?;

    let (stderr, stderr_truncated) = stderr_handle
        .await
        .map_err(|e| BuildError::Io(std::io::Error::other(format!("stderr task failed: {}", e))))?;

    Ok(WaitResult {
        exit_code: status.code(),
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
    })
}

/// Read from an async reader and truncate if too large
///
/// With `echo` set every line is also forwarded to our stderr, so streamed
/// builds stay visible while the text is kept for error suggestions.
async fn read_and_truncate<R: tokio::io::AsyncRead + Unpin>(
    reader: R,
    max_size: usize,
    echo: bool,
) -> (String, bool) {
    let mut buf_reader = BufReader::new(reader);
    let mut output = String::with_capacity(max_size.min(64 * 1024));
    let mut line = String::with_capacity(4096);
    let mut truncated = false;

    loop {
        line.clear();
        match buf_reader.read_line(&mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if echo {
                    eprint!("{}", line);
                }
                if truncated {
                    continue;
                }
                if output.len() + line.len() > max_size {
                    let remaining = max_size.saturating_sub(output.len());
                    let mut cut = remaining.min(line.len());
                    while !line.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    output.push_str(&line[..cut]);
                    output.push_str(TRUNCATION_MARKER);
                    // Keep draining so the child never blocks on a full pipe
                    truncated = true;
                    continue;
                }
                output.push_str(&line);
            }
            Err(e) => {
                tracing::warn!("Error reading output: {}", e);
                break;
            }
        }
    }

    (output, truncated)
}

/// Execute a command synchronously
///
/// Blocking wrapper around `exec_command`; each call drives its own
/// current-thread runtime so callers stay fully sequential.
pub fn exec_command_sync(
    program: &str,
    args: &[&str],
    options: &ExecOptions,
) -> Result<ExecResult, BuildError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BuildError::Io(std::io::Error::other(format!("Failed to create runtime: {}", e))))?;

    rt.block_on(exec_command(program, args, options))
}

/// Execute a shell command string (`<shell> -c <command>`)
pub async fn exec_shell_command(
    shell: &str,
    command: &str,
    options: &ExecOptions,
) -> Result<ExecResult, BuildError> {
    exec_command(shell, &["-c", command], options).await
}
