//! Centralised error hierarchy for the **Enkel interpreter**.
//!
//! Every stage (lexer, parser, resolver, runtime) converts its failure modes
//! into one of the variants defined here. Each stage fails fast: the first
//! error aborts the stage and is handed back to the caller untouched.
//!
//! The module **does not** print diagnostics itself; the driver decides how
//! to report them.

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EnkelError {
    /// No lexical rule matched at the current scan position.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// A required token or construct was absent.
    #[error("[line {line}] Error at {found}: {expected}")]
    Parse {
        /// What the parser was looking for.
        expected: String,

        /// The offending token, already quoted (`'x'`) or `end`.
        found: String,

        line: usize,
    },

    /// Static‑semantics violation found by the resolver.
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Dynamic‑semantics violation during evaluation.
    #[error("[line {line}] Runtime error: {message}")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl EnkelError {
    /// Helper constructor for the **lexer**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        EnkelError::Lex { message, line }
    }

    /// Helper constructor for the **parser**. `found` is the offending lexeme,
    /// or `None` when the parser ran into the end of input.
    pub fn parse<S: Into<String>>(line: usize, found: Option<&str>, expected: S) -> Self {
        let expected: String = expected.into();
        let found: String = match found {
            Some(lexeme) => format!("'{}'", lexeme),
            None => "end".to_string(),
        };

        info!(
            "Creating Parse error: line={}, found={}, expected={}",
            line, found, expected
        );

        EnkelError::Parse {
            expected,
            found,
            line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", line, message);

        EnkelError::Resolve { message, line }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", line, message);

        EnkelError::Runtime { message, line }
    }

    /// `true` when the failure happened before any statement ran.
    pub fn is_static(&self) -> bool {
        matches!(
            self,
            EnkelError::Lex { .. } | EnkelError::Parse { .. } | EnkelError::Resolve { .. }
        )
    }

    /// Source line carried by the error, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            EnkelError::Lex { line, .. }
            | EnkelError::Parse { line, .. }
            | EnkelError::Resolve { line, .. }
            | EnkelError::Runtime { line, .. } => Some(*line),
            EnkelError::Io(_) => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, EnkelError>;
