//! Test doubles shared by the unit tests.

use anyhow::{bail, Result};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::process::{Cmd, CommandOutput, CommandRunner};

/// Records every command instead of running it.
///
/// Programs registered with [`RecordingRunner::fail_on`] exit with the given
/// code, programs registered with [`RecordingRunner::missing`] fail to start,
/// everything else succeeds.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<Cmd>>,
    failures: HashMap<String, (i32, String)>,
    missing: HashSet<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(self, program: &str, code: i32) -> Self {
        self.fail_on_with(program, code, "")
    }

    pub fn fail_on_with(mut self, program: &str, code: i32, stderr: &str) -> Self {
        self.failures
            .insert(program.to_string(), (code, stderr.to_string()));
        self
    }

    pub fn missing(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Cmd> {
        self.calls.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, program: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.program() == program)
            .count()
    }
}

impl CommandRunner for RecordingRunner {
    fn execute(&self, cmd: &Cmd) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(cmd.clone());
        if self.missing.contains(cmd.program()) {
            bail!("Failed to start {}", cmd.program());
        }
        Ok(match self.failures.get(cmd.program()) {
            Some((code, stderr)) => CommandOutput::failed(*code, stderr.as_str()),
            None => CommandOutput::ok(),
        })
    }
}
