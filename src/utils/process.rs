//! Process runner.
//!
//! A non-zero exit status is a normal [`CommandResult`], not an error: git
//! reports "dirty tree", "not an ancestor" and "rebase stopped on a conflict"
//! through its exit code. Only a process that cannot be started at all turns
//! into [`BuddyError::Spawn`].

use crate::errors::{BuddyError, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

/// Exit code reported when a process ended without one (killed by a signal).
pub const ABNORMAL_EXIT_CODE: i32 = 255;

const READ_BUFFER_SIZE: usize = 4096;

/// Outcome of a single process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.code == 0
    }

    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// First line of stderr, handy for short diagnostics
    pub fn first_stderr_line(&self) -> Option<&str> {
        self.stderr.lines().map(str::trim).find(|line| !line.is_empty())
    }
}

/// A fully described process invocation: program, argument vector and an
/// environment overlay merged over the ambient environment.
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    program: OsString,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    current_dir: Option<PathBuf>,
}

impl ProcessCommand {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn env<K: AsRef<OsStr>, V: AsRef<OsStr>>(mut self, key: K, value: V) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_env(&self, key: &str) -> Option<&OsStr> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_os_str())
    }

    fn to_tokio(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Run a command to completion and capture its output.
pub async fn run(command: &ProcessCommand) -> Result<CommandResult> {
    debug!("exec: {}", command);

    let mut cmd = command.to_tokio();
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let output = cmd
        .output()
        .await
        .map_err(|e| BuddyError::spawn(command.program_name(), e))?;

    let result = CommandResult {
        code: output.status.code().unwrap_or(ABNORMAL_EXIT_CODE),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    debug!(code = result.code, "exec finished: {}", command);
    Ok(result)
}

/// Run a command, handing every output line to `on_line` as soon as it
/// arrives.
///
/// stdout and stderr are read concurrently and interleaved in arrival
/// order. Lines are split on `\n` and `\r`, since git redraws progress
/// counters with carriage returns. Both streams are still accumulated in
/// full for the returned [`CommandResult`].
pub async fn stream<F>(command: &ProcessCommand, mut on_line: F) -> Result<CommandResult>
where
    F: FnMut(&str),
{
    debug!("spawn: {}", command);

    let mut cmd = command.to_tokio();
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = cmd
        .spawn()
        .map_err(|e| BuddyError::spawn(command.program_name(), e))?;

    let mut stdout = child.stdout.take().ok_or_else(|| {
        BuddyError::spawn(
            command.program_name(),
            std::io::Error::new(std::io::ErrorKind::Other, "stdout was not captured"),
        )
    })?;
    let mut stderr = child.stderr.take().ok_or_else(|| {
        BuddyError::spawn(
            command.program_name(),
            std::io::Error::new(std::io::ErrorKind::Other, "stderr was not captured"),
        )
    })?;

    let mut out_capture = StreamCapture::default();
    let mut err_capture = StreamCapture::default();
    let mut out_buf = [0u8; READ_BUFFER_SIZE];
    let mut err_buf = [0u8; READ_BUFFER_SIZE];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => {
                match read? {
                    0 => {
                        out_open = false;
                        out_capture.finish(&mut on_line);
                    }
                    n => out_capture.push(&out_buf[..n], &mut on_line),
                }
            }
            read = stderr.read(&mut err_buf), if err_open => {
                match read? {
                    0 => {
                        err_open = false;
                        err_capture.finish(&mut on_line);
                    }
                    n => err_capture.push(&err_buf[..n], &mut on_line),
                }
            }
        }
    }

    let status = child.wait().await?;
    let result = CommandResult {
        code: status.code().unwrap_or(ABNORMAL_EXIT_CODE),
        stdout: out_capture.into_string(),
        stderr: err_capture.into_string(),
    };
    debug!(code = result.code, "spawn finished: {}", command);
    Ok(result)
}

/// Accumulates one output stream and splits it into lines as bytes arrive.
#[derive(Debug, Default)]
struct StreamCapture {
    all: Vec<u8>,
    pending: Vec<u8>,
}

impl StreamCapture {
    fn push<F: FnMut(&str)>(&mut self, chunk: &[u8], on_line: &mut F) {
        self.all.extend_from_slice(chunk);
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                self.flush(on_line);
            } else {
                self.pending.push(byte);
            }
        }
    }

    fn finish<F: FnMut(&str)>(&mut self, on_line: &mut F) {
        self.flush(on_line);
    }

    fn flush<F: FnMut(&str)>(&mut self, on_line: &mut F) {
        if !self.pending.is_empty() {
            on_line(&String::from_utf8_lossy(&self.pending));
            self.pending.clear();
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.all).into_owned()
    }
}
