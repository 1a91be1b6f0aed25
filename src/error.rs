//! Crate-wide error types.
//!
//! Every fallible entry point in this crate returns one of the enums below
//! rather than a boxed `dyn Error`, so callers can match on the failure kind
//! (parse vs. IO vs. semantic vs. configuration) the way the node-stream
//! error model requires.

use std::io;
use thiserror::Error;

/// Errors raised while decoding a single genome node from an input adapter.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("parse error at {file}:{line}: {message}")]
    Syntax {
        file: String,
        line: usize,
        message: String,
    },

    #[error("semantic error at {file}:{line}: {message}")]
    Semantic {
        file: String,
        line: usize,
        message: String,
    },
}

/// Errors raised while pulling from a node-stream.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("visitor error: {0}")]
    Visitor(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("stream order violated: {0}")]
    OutOfOrder(String),
}

/// Errors raised by the compressed bitvector and wavelet tree.
#[derive(Error, Debug)]
pub enum BitvectorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("position {position} out of bounds for bitvector of length {len}")]
    OutOfBounds { position: u64, len: u64 },

    #[error("corrupt bitvector file: {0}")]
    Corrupt(String),

    #[error("invalid construction parameters: {0}")]
    InvalidParameters(String),
}

pub type StreamResult<T> = std::result::Result<T, StreamError>;
pub type ParseResult<T> = std::result::Result<T, ParseError>;
pub type BitvectorResult<T> = std::result::Result<T, BitvectorError>;
