//! Error kinds the installer recognizes.
//!
//! Everything else (I/O, spawn failures) travels as plain `anyhow::Error`
//! with context attached at the call site.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code used when a failure has no status of its own to propagate.
pub const GENERIC_FAILURE_CODE: i32 = 1;

#[derive(Debug, Error)]
pub enum InstallError {
    /// An external command returned a non-zero status.
    ///
    /// `stderr` holds the tool's own complaint when its output was captured.
    #[error("command `{command}` failed with {}{}", describe_status(.code), describe_stderr(.stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// A built module whose file name can't be turned into a `modprobe` name.
    #[error("cannot derive a module name from {}", .path.display())]
    InvalidModuleName { path: PathBuf },

    /// Two built modules would be installed and loaded under the same name.
    #[error(
        "module name collision: '{name}' is built at both {} and {}",
        .first.display(),
        .second.display()
    )]
    ModuleNameCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl InstallError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::CommandFailed { code: Some(code), .. } if *code != 0 => *code,
            _ => GENERIC_FAILURE_CODE,
        }
    }
}

fn describe_status(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit status {}", code),
        None => "no exit status (terminated by signal)".to_string(),
    }
}

fn describe_stderr(stderr: &str) -> String {
    match stderr.trim() {
        "" => String::new(),
        msg => format!(": {}", msg),
    }
}

/// Map any pipeline error to the exit code the process should end with.
///
/// Works through `.context()` layers, so a failed `make` still exits with
/// make's own status.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<InstallError>())
        .map(InstallError::exit_code)
        .unwrap_or(GENERIC_FAILURE_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_command_failed_propagates_status() {
        let err = InstallError::CommandFailed {
            command: "make -C /src".into(),
            code: Some(2),
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "command `make -C /src` failed with exit status 2");
    }

    #[test]
    fn test_signal_maps_to_generic_code() {
        let err = InstallError::CommandFailed {
            command: "modprobe foo".into(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(err.exit_code(), GENERIC_FAILURE_CODE);
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_exit_code_through_context() {
        let result: anyhow::Result<()> = Err(InstallError::CommandFailed {
            command: "depmod -a".into(),
            code: Some(3),
            stderr: String::new(),
        }
        .into());
        let err = result.context("Failed to refresh module dependencies").unwrap_err();
        assert_eq!(exit_code(&err), 3);
    }

    #[test]
    fn test_command_failed_includes_tool_stderr() {
        let err = InstallError::CommandFailed {
            command: "modprobe mt7902e".into(),
            code: Some(1),
            stderr: "modprobe: FATAL: Module mt7902e not found.\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "command `modprobe mt7902e` failed with exit status 1: \
             modprobe: FATAL: Module mt7902e not found."
        );
    }

    #[test]
    fn test_exit_code_for_unrelated_error() {
        let err = anyhow::anyhow!("disk on fire");
        assert_eq!(exit_code(&err), GENERIC_FAILURE_CODE);
    }

    #[test]
    fn test_collision_message_names_both_paths() {
        let err = InstallError::ModuleNameCollision {
            name: "mt7902".into(),
            first: PathBuf::from("/src/a/mt7902.ko"),
            second: PathBuf::from("/src/b/mt7902.ko"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/src/a/mt7902.ko"));
        assert!(msg.contains("/src/b/mt7902.ko"));
        assert_eq!(err.exit_code(), GENERIC_FAILURE_CODE);
    }
}
