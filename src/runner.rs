use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::errors::BenchError;
use crate::types::RunResult;

/// A command line plus the directory it runs in.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// `None` inherits the driver's own working directory.
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args,
            cwd: None,
        }
    }

    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn display(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }
}

/// Something that can run a command line. The pipeline only talks to this.
pub trait Executor {
    fn execute(&mut self, spec: &CommandSpec) -> Result<RunResult, BenchError>;
}

/// Spawns real processes through [`run`].
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    pub timeout: Option<Duration>,
}

impl Executor for SystemExecutor {
    fn execute(&mut self, spec: &CommandSpec) -> Result<RunResult, BenchError> {
        run(spec, self.timeout)
    }
}

/// Run `spec` to completion and capture its output.
///
/// A nonzero exit becomes `BenchError::CommandFailed` carrying stderr. Nothing
/// is retried. With `timeout` unset the call blocks until the child exits and
/// both pipes close, so a background grandchild holding stdout open blocks it
/// too. With a timeout, output still unread that long after the exit is
/// dropped.
pub fn run(spec: &CommandSpec, timeout: Option<Duration>) -> Result<RunResult, BenchError> {
    let command_line = spec.display();
    debug!(command = %command_line, cwd = ?spec.cwd, "spawning");

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.cwd {
        command.current_dir(dir);
    }

    let mut child = command.spawn().map_err(|source| BenchError::Spawn {
        command: command_line.clone(),
        source,
    })?;

    // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        None => child.wait(),
        Some(limit) => match child.wait_timeout(limit) {
            Ok(Some(status)) => Ok(status),
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(BenchError::TimedOut {
                    command: command_line,
                    seconds: limit.as_secs(),
                });
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                Err(e)
            }
        },
    }
    .map_err(|source| BenchError::Spawn {
        command: command_line.clone(),
        source,
    })?;

    let result = RunResult {
        stdout: collect(stdout, timeout),
        stderr: collect(stderr, timeout),
        exit_code: status.code(),
    };
    debug!(
        command = %command_line,
        exit_code = ?result.exit_code,
        stdout_bytes = result.stdout.len(),
        "finished"
    );

    if !status.success() {
        return Err(BenchError::CommandFailed {
            command: command_line,
            status: describe_status(&status),
            stderr: result.stderr,
        });
    }

    Ok(result)
}

/// Resolve `path` against the current directory so it survives a `current_dir` change.
pub fn absolute_program(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<String>> {
    pipe.map(|mut reader| {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
        rx
    })
}

fn collect(output: Option<Receiver<String>>, timeout: Option<Duration>) -> String {
    let Some(rx) = output else {
        return String::new();
    };
    match timeout {
        None => rx.recv().unwrap_or_default(),
        Some(limit) => rx.recv_timeout(limit).unwrap_or_else(|_| {
            debug!("output pipe still open after exit, dropping it");
            String::new()
        }),
    }
}

trait ChildExt {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>>;
}

impl ChildExt for Child {
    fn wait_timeout(&mut self, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
        let start = Instant::now();
        let poll_interval = Duration::from_millis(20);

        loop {
            match self.try_wait()? {
                Some(status) => return Ok(Some(status)),
                None => {
                    if start.elapsed() >= timeout {
                        return Ok(None);
                    }
                    std::thread::sleep(poll_interval);
                }
            }
        }
    }
}
