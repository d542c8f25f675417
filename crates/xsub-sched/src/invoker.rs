//! Subprocess invocation shared by every backend.
//!
//! A [`CommandLine`] is built by the adapter, executed by a [`CommandRunner`],
//! and the resulting [`CommandOutput`] is classified here: a nonzero return
//! code and a successful run without the expected job id are different
//! errors. No timeout is applied; a hanging scheduler command hangs the caller.

use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{SchedError, SchedResult};
use crate::job::JobHandle;

/// Caller-supplied, append-only log stream.
pub type LogSink<'a> = &'a mut (dyn Write + Send);

/// A program invocation: fixed verb plus computed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref dir) = self.current_dir {
            write!(f, "cd {} && ", shell_quote(&dir.display().to_string()))?;
        }
        f.write_str(&shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// Captured result of one subprocess.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A zero-exit result with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failing result.
    pub fn failed(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Stdout followed by stderr, for diagnostics.
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout.trim_end(), self.stderr)
        }
    }
}

/// Executes command lines. The seam between adapters and the operating system.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion and capture its output.
    async fn run(&self, command: &CommandLine) -> SchedResult<CommandOutput>;
}

/// Runs commands as real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandLine) -> SchedResult<CommandOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = command.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!("Running `{}`", command);
        let output = cmd.output().await.map_err(|e| SchedError::Spawn {
            command: command.to_string(),
            source: e,
        })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Records commands and replays canned outputs (for testing).
///
/// Responses are consumed in order; once exhausted every command succeeds
/// with empty output.
#[derive(Debug, Default)]
pub struct MockRunner {
    responses: Mutex<VecDeque<CommandOutput>>,
    calls: Mutex<Vec<CommandLine>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next command.
    pub fn respond(self, output: CommandOutput) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(output);
        self
    }

    /// Queue a zero-exit response with the given stdout.
    pub fn respond_ok(self, stdout: impl Into<String>) -> Self {
        self.respond(CommandOutput::ok(stdout))
    }

    /// Commands issued so far.
    pub fn calls(&self) -> Vec<CommandLine> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &CommandLine) -> SchedResult<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(command.clone());
        let next = self
            .responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        Ok(next.unwrap_or_else(|| CommandOutput::ok("")))
    }
}

/// Submit a job: log the command, run it, and extract the job id with `parse_job_id`.
pub async fn submit_job<F>(
    runner: &dyn CommandRunner,
    command: &CommandLine,
    log: LogSink<'_>,
    parse_job_id: F,
) -> SchedResult<JobHandle>
where
    F: FnOnce(&str) -> Option<String>,
{
    writeln!(log, "cmd: {command}")?;
    writeln!(log, "time: {}", chrono::Local::now())?;

    let output = match runner.run(command).await {
        Ok(output) => output,
        Err(e) => {
            writeln!(log, "failed to run: {e}")?;
            return Err(e);
        }
    };

    if !output.success() {
        tracing::warn!("`{}` exited with {:?}", command, output.code);
        writeln!(log, "rc is not zero: {:?} {}", output.code, output.combined())?;
        return Err(SchedError::SubmitFailed {
            command: command.to_string(),
            code: output.code,
            output: output.combined(),
        });
    }

    let Some(job_id) = parse_job_id(&output.stdout) else {
        writeln!(log, "failed to get job_id:\n{}", output.combined())?;
        return Err(SchedError::JobIdMissing {
            command: command.to_string(),
            output: output.combined(),
        });
    };

    writeln!(log, "{}", output.combined().trim_end())?;
    writeln!(log, "job_id: {job_id}")?;
    tracing::info!("Submitted job {} via `{}`", job_id, command.program);

    Ok(JobHandle {
        job_id,
        raw_output: output.stdout,
    })
}

/// Run a listing command and return its stdout.
pub async fn list_jobs(runner: &dyn CommandRunner, command: &CommandLine) -> SchedResult<String> {
    let output = runner.run(command).await?;
    if !output.success() {
        tracing::warn!("`{}` exited with {:?}", command, output.code);
        return Err(SchedError::CommandFailed {
            command: command.to_string(),
            code: output.code,
            output: output.combined(),
        });
    }
    Ok(output.stdout)
}

/// Run a cancel command and return its output verbatim.
pub async fn cancel_job(runner: &dyn CommandRunner, command: &CommandLine) -> SchedResult<String> {
    let output = runner.run(command).await?;
    if !output.success() {
        tracing::warn!("`{}` exited with {:?}", command, output.code);
        return Err(SchedError::CancelFailed {
            command: command.to_string(),
            code: output.code,
            output: output.combined(),
        });
    }
    tracing::info!("Cancelled via `{}`", command);
    Ok(output.stdout)
}

/// Resolve a path against the current directory without touching the filesystem.
pub fn absolute(path: &Path) -> SchedResult<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Quote a word for a POSIX shell, leaving plain words untouched.
pub fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:%,+@".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
