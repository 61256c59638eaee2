// File: src/errors.rs
//
// Error handling and reporting for the Pebble virtual machine. `Environment`
// stores one of these per failed run; the CLI and REPL render it.

use colored::Colorize;
use std::fmt;

/// Types of errors that can occur in Pebble.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    Parse,
    Assertion,
    Lookup,
    /// Reserved for a corrupted or hand-built instruction stream outside
    /// `Operation`'s known variants. The parser never produces one and
    /// Rust's exhaustive `match` over a closed enum means the executor has
    /// no path that raises it today; kept so the taxonomy matches the
    /// reference interpreter's, should `Operation` ever gain a variant
    /// decoded from outside this crate (e.g. a serialized bytecode format).
    UnknownOpcode,
    Native,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "Parse Error"),
            ErrorKind::Assertion => write!(f, "Assertion Error"),
            ErrorKind::Lookup => write!(f, "Lookup Error"),
            ErrorKind::UnknownOpcode => write!(f, "Unknown Opcode"),
            ErrorKind::Native => write!(f, "Native Error"),
        }
    }
}

/// A structured error, with just enough location context to point at the
/// offending character index (parse errors) or word (lookup errors).
#[derive(Debug, Clone)]
pub struct PebbleError {
    pub kind: ErrorKind,
    pub message: String,
    pub index: Option<usize>,
    pub word: Option<String>,
    pub help: Option<String>,
}

impl PebbleError {
    pub fn new(kind: ErrorKind, message: String) -> Self {
        Self { kind, message, index: None, word: None, help: None }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_word(mut self, word: String) -> Self {
        self.word = Some(word);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    pub fn parse(message: String, index: usize) -> Self {
        Self::new(ErrorKind::Parse, message).with_index(index)
    }

    pub fn assertion(message: String) -> Self {
        Self::new(ErrorKind::Assertion, message)
    }

    pub fn lookup(word: &str) -> Self {
        Self::new(ErrorKind::Lookup, format!("Failed to look up the word '{}'", word))
            .with_word(word.to_string())
    }
}

impl fmt::Display for PebbleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        if let Some(index) = self.index {
            writeln!(f, "{}", format!("  --> char {}", index).bright_blue())?;
        } else if let Some(ref word) = self.word {
            writeln!(f, "{}", format!("  --> word '{}'", word).bright_blue())?;
        }

        if let Some(ref help) = self.help {
            writeln!(f, "   {} {}", "=".bright_yellow(), format!("help: {}", help).bright_yellow())?;
        }

        Ok(())
    }
}

impl std::error::Error for PebbleError {}
