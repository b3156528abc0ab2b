//! Centralised error hierarchy for the interpreter.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  This
//! enables a uniform `Result<T>` alias throughout the crate while still
//! preserving rich diagnostic detail.  The `Display` impls are load-bearing:
//! the diagnostic line shapes they produce are pinned by the test suite.
//!
//! The module **does not** print diagnostics itself; the runtime façade owns
//! the output sinks.

use std::io;

use thiserror::Error;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[Line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error at a specific token.
    #[error("[Line {line}] Error at '{lexeme}': {message}")]
    Parse {
        message: String,
        lexeme: String,
        line: usize,
    },

    /// Static-analysis (resolver) failure at a specific token.
    #[error("[Line {line}] Error at '{lexeme}': {message}")]
    Resolve {
        message: String,
        lexeme: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error("[Line {line}] {message}")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        LoxError::Lex {
            message: msg.into(),
            line,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        LoxError::Parse {
            message: msg.into(),
            lexeme: error_lexeme(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        LoxError::Resolve {
            message: msg.into(),
            lexeme: error_lexeme(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        LoxError::Runtime {
            message: msg.into(),
            line,
        }
    }

    /// Whether this error must keep the interpreter from running.
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// Parse and resolve diagnostics name the offending token; the EOF token has
/// an empty lexeme and is reported as `end`.
fn error_lexeme(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        "end".to_string()
    } else {
        token.lexeme.clone()
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
