//! Operator interaction seam for the interactive commands.

use std::io::{self, BufRead, Write};

use crate::error::Result;

/// Source of operator responses for the interactive flows. The merge and
/// coach commands are written against this trait so tests can script the
/// conversation.
pub trait Console {
    /// Shows `message` and returns the operator's reply, trimmed.
    fn ask(&mut self, message: &str) -> Result<String>;
}

/// Console backed by the process's stdin and stdout.
pub struct StdinConsole;

impl Console for StdinConsole {
    fn ask(&mut self, message: &str) -> Result<String> {
        let mut stdout = io::stdout();
        writeln!(stdout, "{message}")?;
        write!(stdout, "? ")?;
        stdout.flush()?;

        let mut reply = String::new();
        io::stdin().lock().read_line(&mut reply)?;
        Ok(reply.trim().to_string())
    }
}
