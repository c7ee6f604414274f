use crate::error::{ReleaseError, Result};
use log::info;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Runs the project's test suite, streaming its output to the console
pub struct TestRunner {
    command: Vec<String>,
    working_dir: PathBuf,
}

impl TestRunner {
    pub fn new(command: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self { command, working_dir: working_dir.into() }
    }

    pub async fn run(&self) -> Result<()> {
        let (program, args) = self.command.split_first().ok_or(ReleaseError::EmptyTestCommand)?;
        let command_line = self.command.join(" ");
        info!("Running tests: {}", command_line);

        let status = Command::new(program)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| ReleaseError::CommandSpawn { command: command_line.clone(), source })?;

        if !status.success() {
            return Err(ReleaseError::TestFailure { command: command_line, code: status.code() });
        }

        info!("All tests passed");
        Ok(())
    }
}
