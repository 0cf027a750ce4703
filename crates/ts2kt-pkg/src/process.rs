//! Launching external tools.
//!
//! A child inherits stdin and stdout from the caller unless configured
//! otherwise. Its stderr is always captured: every chunk read from the pipe
//! is kept, in arrival order, and only inspected once the process has exited.
//! What counts as failure is decided by [`ErrorDetection`].

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{error, info, trace, warn};

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Errors from running an external command.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The executable could not be started at all.
    #[error("`{command} {}` failed to start: {source}", .args.join(" "))]
    Launch {
        command: String,
        args: Vec<String>,
        #[source]
        source: io::Error,
    },

    /// The process ran and was judged to have failed.
    #[error("`{command}` failed{}: {stderr}", format_status(.status))]
    Execution {
        command: String,
        /// Captured stderr chunks, concatenated in arrival order.
        stderr: String,
        /// Exit code, `None` when the process was killed by a signal.
        status: Option<i32>,
    },

    /// Reading the child's output or waiting for it failed.
    #[error("I/O error while running `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

fn format_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!(" (exit code {code})"),
        None => String::new(),
    }
}

/// How a finished process is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorDetection {
    /// Fail when anything was written to stderr, whatever the exit code.
    #[default]
    StderrPresence,
    /// Fail on a non-success exit status only.
    ExitCode,
}

impl ErrorDetection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StderrPresence => "stderr-presence",
            Self::ExitCode => "exit-code",
        }
    }

    /// Whether a process that exited with `success` and wrote
    /// `stderr_chunks` has failed.
    pub fn is_failure(&self, success: bool, stderr_chunks: &[Vec<u8>]) -> bool {
        match self {
            Self::StderrPresence => !stderr_chunks.is_empty(),
            Self::ExitCode => !success,
        }
    }
}

impl fmt::Display for ErrorDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorDetection {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stderr-presence" => Ok(Self::StderrPresence),
            "exit-code" => Ok(Self::ExitCode),
            _ => Err(crate::ConfigError::UnknownErrorDetection(s.to_string())),
        }
    }
}

/// Where the child's stdin comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdinMode {
    /// Share the caller's stdin.
    #[default]
    Inherit,
    /// Give the child an empty stdin.
    Null,
}

impl StdinMode {
    fn stdio(self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Null => Stdio::null(),
        }
    }
}

/// An in-memory byte buffer shared between the runner and its owner.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&self, bytes: &[u8]) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
    }

    /// A copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Everything written so far, decoded lossily as UTF-8.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

/// Where the child's stdout goes.
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    /// Share the caller's stdout, so output shows up in real time.
    #[default]
    Inherit,
    /// Copy output into a buffer as it arrives.
    Buffer(SharedBuffer),
}

/// Something that can run an external command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` with `args` and wait for it to finish.
    async fn run(&self, command: &str, args: &[String]) -> Result<(), ProcessError>;
}

/// Runs commands as tokio child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    working_dir: Option<PathBuf>,
    stdin: StdinMode,
    stdout: OutputSink,
    error_detection: ErrorDetection,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run children in `dir` instead of the caller's current directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_stdin(mut self, stdin: StdinMode) -> Self {
        self.stdin = stdin;
        self
    }

    #[must_use]
    pub fn with_stdout(mut self, stdout: OutputSink) -> Self {
        self.stdout = stdout;
        self
    }

    #[must_use]
    pub fn with_error_detection(mut self, mode: ErrorDetection) -> Self {
        self.error_detection = mode;
        self
    }

    fn command(&self, program: &str, args: &[String]) -> Command {
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(self.stdin.stdio())
            .stderr(Stdio::piped());

        match self.stdout {
            OutputSink::Inherit => command.stdout(Stdio::inherit()),
            OutputSink::Buffer(_) => command.stdout(Stdio::piped()),
        };

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        command
    }

    fn judge(
        &self,
        command: &str,
        status: ExitStatus,
        chunks: &[Vec<u8>],
    ) -> Result<(), ProcessError> {
        let stderr = String::from_utf8_lossy(&chunks.concat()).into_owned();

        if self.error_detection.is_failure(status.success(), chunks) {
            return Err(ProcessError::Execution {
                command: command.to_string(),
                stderr,
                status: status.code(),
            });
        }

        if !stderr.is_empty() {
            warn!(command, "command succeeded but wrote to stderr: {}", stderr.trim_end());
        }

        Ok(())
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &str, args: &[String]) -> Result<(), ProcessError> {
        info!("Running command: {} {}", command, args.join(" "));

        let mut child = match self.command(command, args).spawn() {
            Ok(child) => child,
            Err(source) => {
                error!("`{} {}` failed: {}", command, args.join(" "), source);
                return Err(ProcessError::Launch {
                    command: command.to_string(),
                    args: args.to_vec(),
                    source,
                });
            }
        };

        let stderr = child.stderr.take();
        let stdout = child.stdout.take();
        let sink = match &self.stdout {
            OutputSink::Buffer(buffer) => Some(buffer.clone()),
            OutputSink::Inherit => None,
        };

        let (chunks, copied, status) = tokio::join!(
            collect_chunks(stderr),
            forward_output(stdout, sink),
            child.wait(),
        );

        let io_error = |source| ProcessError::Io {
            command: command.to_string(),
            source,
        };
        let chunks = chunks.map_err(io_error)?;
        copied.map_err(io_error)?;
        let status = status.map_err(io_error)?;

        trace!(command, ?status, chunks = chunks.len(), "process closed");

        self.judge(command, status, &chunks)
    }
}

/// Read `reader` to the end, keeping each read as its own chunk.
async fn collect_chunks<R>(reader: Option<R>) -> io::Result<Vec<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut chunks = Vec::new();
    let Some(mut reader) = reader else {
        return Ok(chunks);
    };

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        chunks.push(buf[..n].to_vec());
    }

    Ok(chunks)
}

/// Copy `reader` into `sink` until end of stream.
async fn forward_output<R>(reader: Option<R>, sink: Option<SharedBuffer>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let (Some(mut reader), Some(sink)) = (reader, sink) else {
        return Ok(());
    };

    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        sink.append(&buf[..n]);
    }

    Ok(())
}
