use std::io::{BufRead, BufReader, Read};
use std::iter::FusedIterator;
use std::path::Path;

use crate::error::{Error, GrammarError, ParseError, Result};
use crate::source::LineSource;

/// A line-oriented file format.
pub trait Grammar {
    type Record;

    /// Suffix of uncompressed files, e.g. `".vcf"`.
    const EXTENSION: &'static str;

    /// Consumes one trimmed, non-blank line.
    ///
    /// `number` is 1-based and counts blank lines too. Header-like lines return
    /// `Ok(None)`.
    fn line(&mut self, number: usize, line: &str)
        -> std::result::Result<Option<Self::Record>, GrammarError>;
}

/// Lazily parses records with a [`Grammar`], one line per `next()`.
///
/// A malformed line is yielded as `Err(Error::Parse(..))` and iteration goes on
/// with the next line, unless the grammar marks it fatal. A fatal parse error
/// or an I/O error is yielded once, after which the iterator is exhausted.
pub struct Records<G: Grammar, R: BufRead> {
    source: LineSource<R>,
    grammar: G,
    halted: bool,
}

impl<G: Grammar> Records<G, BufReader<Box<dyn Read>>> {
    pub fn from_path<P: AsRef<Path>>(path: P, grammar: G) -> Result<Self> {
        let source = LineSource::from_path(path, G::EXTENSION)?;
        Ok(Self::new(source, grammar))
    }
}

impl<G: Grammar, R: Read> Records<G, BufReader<R>> {
    pub fn from_reader(reader: R, grammar: G) -> Self {
        Self::new(LineSource::from_reader(reader), grammar)
    }
}

impl<G: Grammar, R: BufRead> Records<G, R> {
    pub fn new(source: LineSource<R>, grammar: G) -> Self {
        Self {
            source,
            grammar,
            halted: false,
        }
    }

    pub fn grammar(&self) -> &G {
        &self.grammar
    }

    pub fn path(&self) -> &str {
        self.source.path()
    }

    pub fn line_number(&self) -> usize {
        self.source.line_number()
    }
}

impl<G: Grammar, R: BufRead> Iterator for Records<G, R> {
    type Item = Result<G::Record>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.halted {
            let (number, line) = match self.source.read_line() {
                Ok(Some(next)) => next,
                Ok(None) => {
                    self.halted = true;
                    return None;
                }
                Err(err) => {
                    self.halted = true;
                    return Some(Err(err));
                }
            };
            match self.grammar.line(number, line) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(GrammarError { message, fatal }) => {
                    let line = line.to_owned();
                    let err = ParseError {
                        path: self.source.path().to_owned(),
                        line_number: number,
                        line,
                        message,
                        fatal,
                    };
                    self.halted = fatal;
                    return Some(Err(Error::Parse(err)));
                }
            }
        }
        None
    }
}

impl<G: Grammar, R: BufRead> FusedIterator for Records<G, R> {}
