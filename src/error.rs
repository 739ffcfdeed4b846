//! Error types shared by the line source, the grammars and the importer.

use std::fmt;
use std::io;
use std::path::PathBuf;

use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The file suffix is neither the grammar's extension nor a gzip wrapper.
    #[error("unrecognized extension for file {}; got {found:?}, expected {expected:?} or \"{expected}.gz\"", .path.display())]
    UnrecognizedExtension {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The destination already holds variant data and `append` was not requested.
    #[error("VCF data has already been imported; rerun with the append option to force")]
    AlreadyImported,

    /// A row collided with one already in the store.
    #[error("duplicate entry, the store already holds this site: {0}")]
    DuplicateEntry(#[source] rusqlite::Error),

    #[error("storage error: {0}")]
    Storage(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, _)
                if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Error::DuplicateEntry(err)
            }
            err => Error::Storage(err),
        }
    }
}

impl Error {
    /// Line-level parse errors are the only ones an import may skip over.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Parse(e) if !e.is_fatal())
    }
}

/// A grammar failure attached to the line that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    pub path: String,
    pub line_number: usize,
    pub line: String,
    pub message: String,
    pub fatal: bool,
}

impl ParseError {
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} - {}\n\t\"{}\"",
            self.path, self.line_number, self.message, self.line
        )
    }
}

/// What a [`Grammar`](crate::reader::Grammar) reports for a line it cannot accept.
///
/// The reader turns it into a [`ParseError`] by adding the path, line number and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarError {
    pub message: String,
    pub fatal: bool,
}

impl GrammarError {
    /// The line is rejected but the stream goes on.
    pub fn line<S: Into<String>>(message: S) -> Self {
        GrammarError {
            message: message.into(),
            fatal: false,
        }
    }

    /// Nothing after this line can be trusted.
    pub fn fatal<S: Into<String>>(message: S) -> Self {
        GrammarError {
            message: message.into(),
            fatal: true,
        }
    }
}
