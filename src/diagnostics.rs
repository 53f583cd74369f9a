use std::fmt;

use thiserror::Error;

/// Classification of a diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    InvalidArgument,
    Preprocess,
    Execution,
    Lifecycle,
    ScriptPack,
}

/// Rich diagnostic information surfaced to end users.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::InvalidArgument, message)
    }

    pub fn lifecycle(message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Lifecycle, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if !self.notes.is_empty() {
            writeln!(f)?;
            for note in &self.notes {
                writeln!(f, "  note: {note}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

/// Unified error type for the Scriptum toolchain.
#[derive(Debug, Error)]
pub enum ScriptumError {
    #[error("{0}")]
    Diagnostic(#[from] Diagnostic),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl ScriptumError {
    /// Kind of the underlying diagnostic, if this error carries one.
    pub fn kind(&self) -> Option<&DiagnosticKind> {
        match self {
            ScriptumError::Diagnostic(diag) => Some(&diag.kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptumError>;
