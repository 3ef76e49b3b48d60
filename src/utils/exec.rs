//! Shell command execution for compressor backends.
//!
//! ```ignore
//! let output = Cmd::shell("csso").stdin(css).run()?;
//! ```

use crate::log;
use anyhow::{Context, Result, bail};
use std::{
    io::Write,
    process::{Command, Output, Stdio},
    thread,
};

/// A command line run through the platform shell.
pub struct Cmd {
    line: String,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    pub fn shell(line: &str) -> Self {
        Self {
            line: line.to_string(),
            stdin_data: None,
        }
    }

    /// Pipe `data` to the process; without it stdin is null.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    fn command(&self) -> Command {
        #[cfg(windows)]
        let (shell, flag) = ("cmd", "/C");
        #[cfg(not(windows))]
        let (shell, flag) = ("sh", "-c");
        let mut cmd = Command::new(shell);
        cmd.args([flag, self.line.as_str()]);
        cmd
    }

    /// First word of the command line, for messages.
    fn name(&self) -> &str {
        self.line.split_whitespace().next().unwrap_or("sh")
    }

    /// Run to completion and capture stdout.
    ///
    /// A non-zero exit is an error carrying the command's stderr. On success
    /// any stderr output is logged.
    pub fn run(self) -> Result<Output> {
        let name = self.name().to_string();
        let mut child = self
            .command()
            .stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn `{name}`"))?;

        // Separate writer thread: a child that fills stdout before reading
        // all of stdin would otherwise block both sides.
        let writer = match (child.stdin.take(), self.stdin_data) {
            (Some(mut stdin), Some(data)) => Some(thread::spawn(move || stdin.write_all(&data))),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{name}`"))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !output.status.success() {
            if stderr.is_empty() {
                bail!("`{name}` failed with {}", output.status);
            }
            bail!("`{name}` failed with {}\n{stderr}", output.status);
        }

        if let Some(writer) = writer {
            let written = writer
                .join()
                .map_err(|_| anyhow::anyhow!("stdin writer for `{name}` panicked"))?;
            if let Err(e) = written
                && e.kind() != std::io::ErrorKind::BrokenPipe
            {
                return Err(e).with_context(|| format!("failed to write stdin to `{name}`"));
            }
        }

        if !stderr.is_empty() {
            log!(&name; "{}", stderr);
        }
        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_stdin_pipe() {
        let output = Cmd::shell("cat").stdin(b"test data").run().unwrap();
        assert_eq!(output.stdout, b"test data");
    }

    #[test]
    fn test_no_stdin_reads_null() {
        let output = Cmd::shell("cat").run().unwrap();
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn test_large_stdin_does_not_deadlock() {
        let data = vec![b'x'; 4 * 1024 * 1024];
        let output = Cmd::shell("cat").stdin(&data).run().unwrap();
        assert_eq!(output.stdout.len(), data.len());
    }

    #[test]
    fn test_failure_carries_stderr() {
        let err = Cmd::shell("echo broken >&2; exit 3").run().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("failed"));
        assert!(msg.contains("broken"));
    }
}
