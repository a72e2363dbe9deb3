use crate::error::BenchError;
use std::io::{BufRead, Write};

/// Pause point between attempts, used by interactive runs.
pub trait Confirm {
    fn wait(&mut self, message: &str) -> Result<(), BenchError>;
}

/// Never blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoConfirm;

impl Confirm for NoConfirm {
    fn wait(&mut self, _message: &str) -> Result<(), BenchError> {
        Ok(())
    }
}

/// Prints the message and waits for ENTER on stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn wait(&mut self, message: &str) -> Result<(), BenchError> {
        let mut stderr = std::io::stderr();
        write!(stderr, "{} [press ENTER] ", message)?;
        stderr.flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }
}
