//! Running subprocesses with captured output and a deadline.
//!
//! Two reader threads forward the lines of stdout and stderr of the child to
//! a channel. The calling thread receives them with a timeout, so that it can
//! poll the child and kill it once the deadline has passed.
use crate::error::HarnessError;
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use log::{debug, warn};
use std::{
    collections::VecDeque,
    fmt,
    io::{BufRead, BufReader, Read},
    process::{Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const DRAIN_TIMEOUT: Duration = Duration::from_millis(100);
const CHANNEL_CAPACITY: usize = 1024;
const MAX_LINE_BYTES: u64 = 8 * 1024;

/// Captured output beyond this size is dropped, oldest lines first.
pub const MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// A program with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program.
    pub program: String,

    /// Arguments.
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Command without arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
        }
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit status and output of a finished process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit status.
    pub status: ExitStatus,

    /// Interleaved lines of stdout and stderr.
    pub output: String,
}

impl ProcessOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

fn spawn_reader<R: Read + Send + 'static>(stream: R, tx: Sender<String>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            // Longer lines are split.
            match (&mut reader).take(MAX_LINE_BYTES).read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

/// The last lines of the output of a process.
#[derive(Debug, Default)]
struct OutputTail {
    lines: VecDeque<String>,
    bytes: usize,
    omitted: usize,
}

impl OutputTail {
    fn push(&mut self, line: String) {
        debug!("| {}", line);
        self.bytes += line.len() + 1;
        self.lines.push_back(line);
        while self.bytes > MAX_OUTPUT_BYTES && self.lines.len() > 1 {
            if let Some(old) = self.lines.pop_front() {
                self.bytes -= old.len() + 1;
                self.omitted += 1;
            }
        }
    }

    fn into_string(self) -> String {
        let mut output = String::with_capacity(self.bytes);
        if self.omitted > 0 {
            output.push_str(&format!("[{} earlier lines omitted]\n", self.omitted));
        }
        for line in self.lines {
            output.push_str(&line);
            output.push('\n');
        }
        output
    }
}

/// Runs `command` and waits for it to exit.
///
/// stdin is closed. If `timeout` passes before the process exits, it is
/// killed and [`HarnessError::ValidationTimeoutError`] is returned. Only the
/// last [`MAX_OUTPUT_BYTES`] of output are kept.
pub fn run(
    mut command: Command,
    display: &str,
    timeout: Option<Duration>,
) -> Result<ProcessOutput, HarnessError> {
    let spawn_error = |source| HarnessError::SpawnError {
        command: display.to_string(),
        source,
    };

    debug!("Run `{}`", display);
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    let (tx, rx) = bounded(CHANNEL_CAPACITY);
    if let Some(stdout) = child.stdout.take() {
        spawn_reader(stdout, tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_reader(stderr, tx.clone());
    }
    drop(tx);

    // A deadline past the range of `Instant` is no deadline.
    let deadline = timeout.and_then(|t| Some((Instant::now().checked_add(t)?, t)));
    let mut output = OutputTail::default();
    let status = loop {
        if let Some(status) = child.try_wait().map_err(spawn_error)? {
            break status;
        }
        let wait = match deadline {
            Some((deadline, timeout)) => {
                let now = Instant::now();
                if now >= deadline {
                    warn!("`{}` did not finish within {:?}, killing it", display, timeout);
                    // Both fail only if the child has exited in the meantime.
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(HarnessError::ValidationTimeoutError(timeout));
                }
                (deadline - now).min(POLL_INTERVAL)
            }
            None => POLL_INTERVAL,
        };
        match rx.recv_timeout(wait) {
            Ok(line) => output.push(line),
            Err(RecvTimeoutError::Timeout) => {}
            // Both streams are closed but the child is still running.
            Err(RecvTimeoutError::Disconnected) => thread::sleep(wait),
        }
    };

    // Output still in flight. A grandchild may hold the pipes open, so do not
    // wait for the readers to finish.
    while let Ok(line) = rx.recv_timeout(DRAIN_TIMEOUT) {
        output.push(line);
    }

    debug!("`{}` exited with {}", display, status);
    Ok(ProcessOutput {
        status,
        output: output.into_string(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("sh").arg("-c").arg(script)
    }

    fn run_spec(
        spec: &CommandSpec,
        timeout: Option<Duration>,
    ) -> Result<ProcessOutput, HarnessError> {
        run(spec.command(), &spec.to_string(), timeout)
    }

    #[test]
    fn test_captures_stdout_and_stderr() {
        let out = run_spec(&sh("echo hello; echo world >&2; exit 3"), None).unwrap();
        assert_eq!(out.code(), Some(3));
        assert!(out.output.contains("hello\n"));
        assert!(out.output.contains("world\n"));
    }

    #[test]
    fn test_timeout_kills_the_process() {
        let start = Instant::now();
        let err = run_spec(
            &CommandSpec::new("sleep").arg("10"),
            Some(Duration::from_millis(300)),
        )
        .unwrap_err();
        assert!(matches!(err, HarnessError::ValidationTimeoutError(_)));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_finishes_before_timeout() {
        let out = run_spec(&sh("echo done"), Some(Duration::from_secs(30))).unwrap();
        assert!(out.success());
        assert_eq!(out.output, "done\n");
    }

    #[test]
    fn test_huge_timeout_means_no_deadline() {
        for timeout in [Duration::from_secs(u64::MAX), Duration::MAX] {
            let out = run_spec(&sh("echo done"), Some(timeout)).unwrap();
            assert!(out.success());
            assert_eq!(out.output, "done\n");
        }
    }

    #[test]
    fn test_keeps_the_tail_of_long_output() {
        let out = run_spec(&sh("yes 0123456789 | head -n 20000; echo last"), None).unwrap();
        assert!(out.success());
        assert!(out.output.len() <= MAX_OUTPUT_BYTES + 64);
        assert!(out.output.starts_with("["));
        assert!(out.output.contains("earlier lines omitted]\n"));
        assert!(out.output.ends_with("0123456789\nlast\n"));
    }

    #[test]
    fn test_splits_long_lines() {
        let out = run_spec(&sh("head -c 100000 /dev/zero | tr '\\0' a"), None).unwrap();
        assert!(out.success());
        assert!(out.output.len() <= MAX_OUTPUT_BYTES + 64);
        assert!(out
            .output
            .lines()
            .skip(1)
            .all(|line| !line.is_empty() && line.len() <= MAX_LINE_BYTES as usize));
    }

    #[test]
    fn test_missing_program() {
        let err = run_spec(&CommandSpec::new("/nonexistent/program"), None).unwrap_err();
        assert!(matches!(err, HarnessError::SpawnError { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(sh("true").to_string(), "sh -c true");
    }
}
