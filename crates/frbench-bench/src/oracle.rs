//! External tools the runner treats as black boxes: the test command and
//! the patch applier.

use crate::error::BenchError;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub passed: bool,
    pub output: String,
    pub duration: Duration,
}

/// Runs the project's tests against the workspace.
pub trait TestOracle {
    fn run(&self, workspace: &Path) -> Result<TestOutcome, BenchError>;
}

/// Applies a unified diff to the workspace.
pub trait Patcher {
    fn apply(&self, workspace: &Path, patch: &[u8]) -> Result<(), BenchError>;
}

/// Test oracle backed by a command whose exit code is the verdict.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandOracle {
    /// `argv[0]` is the program, the rest its arguments.
    pub fn from_argv(argv: &[String]) -> Result<Self, BenchError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BenchError::Setup("oracle command is empty".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Default for CommandOracle {
    fn default() -> Self {
        Self {
            program: "go".into(),
            args: vec!["test".into(), "./...".into()],
        }
    }
}

impl TestOracle for CommandOracle {
    fn run(&self, workspace: &Path) -> Result<TestOutcome, BenchError> {
        let start = Instant::now();

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(workspace)
            .output()
            .map_err(|e| BenchError::Oracle(format!("cannot run {}: {}", self.program, e)))?;

        let duration = start.elapsed();
        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(
            program = %self.program,
            code = output.status.code().unwrap_or(-1),
            duration_ms = duration.as_millis() as u64,
            "test oracle finished"
        );

        Ok(TestOutcome {
            passed: output.status.success(),
            output: text,
            duration,
        })
    }
}

/// `patch -u -N -F 10 -d <workspace>` with the diff on stdin.
#[derive(Debug, Clone)]
pub struct PatchCommand {
    pub program: String,
    pub fuzz: u32,
}

impl Default for PatchCommand {
    fn default() -> Self {
        Self {
            program: "patch".into(),
            fuzz: 10,
        }
    }
}

impl Patcher for PatchCommand {
    fn apply(&self, workspace: &Path, patch: &[u8]) -> Result<(), BenchError> {
        let fuzz = self.fuzz.to_string();
        let mut child = Command::new(&self.program)
            .args(["-u", "-N", "-F", fuzz.as_str(), "-d"])
            .arg(workspace)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(patch)?;
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).to_string();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(BenchError::Patch(text.trim().to_string()));
        }
        Ok(())
    }
}
