//! External command execution.
//!
//! Every step of the installer is a shell-out. Commands are described with
//! the [`Cmd`] builder and handed to a [`CommandRunner`], which lets tests
//! swap in a fake and assert the exact invocation sequence without touching
//! `make`, `depmod` or `modprobe`.
//!
//! ```rust,ignore
//! Cmd::new("make")
//!     .arg("-C")
//!     .arg_path(&repo_root)
//!     .error_msg("Failed to build driver modules")
//!     .interactive()
//!     .run_with(&SystemRunner)?;
//! ```

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::InstallError;

/// Description of a single external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    interactive: bool,
    error_msg: Option<String>,
}

impl Cmd {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            interactive: false,
            error_msg: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path argument, byte for byte.
    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Inherit stdio so long-running tools stream straight to the terminal.
    ///
    /// Without it, output is captured and stderr ends up in the error when
    /// the command fails.
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Context attached to the error when the command fails.
    pub fn error_msg(mut self, msg: impl Into<String>) -> Self {
        self.error_msg = Some(msg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Echo, execute and check the command.
    ///
    /// Captured stdout is replayed on success. A non-zero exit becomes
    /// [`InstallError::CommandFailed`] carrying the captured stderr.
    pub fn run_with<R: CommandRunner + ?Sized>(&self, runner: &R) -> Result<CommandOutput> {
        println!("$ {}", self);

        let output = runner.execute(self)?;
        tracing::debug!(command = %self, code = ?output.code, "command finished");

        if output.success() {
            if !output.stdout.is_empty() {
                print!("{}", output.stdout);
            }
            if !output.stderr.is_empty() {
                eprint!("{}", output.stderr);
            }
            return Ok(output);
        }

        let err = anyhow::Error::new(InstallError::CommandFailed {
            command: self.to_string(),
            code: output.code,
            stderr: output.stderr,
        });
        match &self.error_msg {
            Some(msg) => Err(err.context(msg.clone())),
            None => Err(err),
        }
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Result of running a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout (empty for interactive commands).
    pub stdout: String,
    /// Captured stderr (empty for interactive commands).
    pub stderr: String,
}

impl CommandOutput {
    /// A successful, silent run.
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            ..Self::default()
        }
    }

    /// A run that exited with `code`, printing `stderr`.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that can execute a [`Cmd`].
///
/// Implementations report a non-zero exit as data in [`CommandOutput`];
/// only a failure to start the program is an `Err`.
pub trait CommandRunner {
    fn execute(&self, cmd: &Cmd) -> Result<CommandOutput>;
}

/// Runs commands on the host with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn execute(&self, cmd: &Cmd) -> Result<CommandOutput> {
        let mut command = Command::new(cmd.program());
        command.args(cmd.get_args());

        if cmd.is_interactive() {
            let status = command
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .with_context(|| format!("Failed to start {}", cmd.program()))?;
            return Ok(CommandOutput {
                code: status.code(),
                ..CommandOutput::default()
            });
        }

        let output = command
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to start {}", cmd.program()))?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
