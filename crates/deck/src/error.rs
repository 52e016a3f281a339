//! Result and Error types for mcnptools-deck

// mcnptools modules
use mcnptools_utils::f;

// crate modules
use crate::diagnostic::{Code, Diagnostic, Span};
use crate::lexer::Block;

/// Type alias for Result<T, deck::Error>
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for the `mcnptools-deck` crate
///
/// Only failures that stop a deck from being read at all are errors. Anything
/// found after the deck has been segmented into blocks is reported as a
/// [Diagnostic] instead.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed input/output stream")]
    IOError(#[from] std::io::Error),

    #[error("failed to (de)serialise")]
    FailedSerde(#[from] serde_json::Error),

    #[error("no title card found on line {line}")]
    MissingTitle { line: usize },

    #[error("bad block separator on line {line}: {reason}")]
    BadBlockSeparator { line: usize, reason: String },

    #[error("{block} block has no content (line {line})")]
    EmptyBlock { block: Block, line: usize },
}

impl Error {
    /// Diagnostic code corresponding to the error
    pub fn code(&self) -> Code {
        match self {
            Self::IOError(_) | Self::FailedSerde(_) => Code::IoError,
            Self::MissingTitle { .. } => Code::MissingTitle,
            Self::BadBlockSeparator { .. } => Code::BadBlockSeparator,
            Self::EmptyBlock { .. } => Code::EmptyBlock,
        }
    }

    /// Line the error is anchored to, if any
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::IOError(_) | Self::FailedSerde(_) => None,
            Self::MissingTitle { line }
            | Self::BadBlockSeparator { line, .. }
            | Self::EmptyBlock { line, .. } => Some(Span::line(*line)),
        }
    }

    /// Convert into the single fatal diagnostic that ends an analysis
    pub fn into_diagnostic(self) -> Diagnostic {
        let message = match &self {
            Self::IOError(e) => f!("failed to read deck: {e}"),
            _ => self.to_string(),
        };
        Diagnostic::new(self.code(), self.span(), message)
    }
}
