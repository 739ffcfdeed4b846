use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::error::{Error, Result};

/// Path label used for sources that did not come from a file.
pub const STREAM_PATH: &str = "<stream>";

/// Numbered, trimmed lines from a byte source.
///
/// Blank lines are skipped but still count towards line numbers, so the numbers
/// reported in errors match what an editor shows.
pub struct LineSource<R: BufRead> {
    path: String,
    inner: R,
    buf: String,
    line_number: usize,
    finished: bool,
}

impl LineSource<BufReader<Box<dyn Read>>> {
    /// Opens `path`, decompressing when it ends in `.gz`.
    ///
    /// Any other suffix than `extension` or a `.gz` wrapper is rejected before
    /// the file is touched.
    pub fn from_path<P: AsRef<Path>>(path: P, extension: &'static str) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let reader: Box<dyn Read> = if name.ends_with(".gz") {
            let (reader, _format) = niffler::from_path(path).map_err(|e| Error::Io {
                path: label.clone(),
                source: niffler_to_io(e),
            })?;
            reader
        } else if name.ends_with(extension) {
            let file = File::open(path).map_err(|source| Error::Io {
                path: label.clone(),
                source,
            })?;
            Box::new(file)
        } else {
            let found = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            return Err(Error::UnrecognizedExtension {
                path: path.to_path_buf(),
                found,
                expected: extension,
            });
        };
        Ok(Self::with_path(BufReader::new(reader), label))
    }
}

impl<R: Read> LineSource<BufReader<R>> {
    pub fn from_reader(reader: R) -> Self {
        Self::with_path(BufReader::new(reader), STREAM_PATH.to_owned())
    }
}

impl<R: BufRead> LineSource<R> {
    pub fn with_path(inner: R, path: String) -> Self {
        Self {
            path,
            inner,
            buf: String::new(),
            line_number: 0,
            finished: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of the line most recently returned by [`read_line`](Self::read_line).
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Next non-blank line with surrounding whitespace removed, and its number.
    ///
    /// Returns `Ok(None)` once the source is drained. After the first `Ok(None)`
    /// or `Err` every further call returns `Ok(None)`.
    pub fn read_line(&mut self) -> Result<Option<(usize, &str)>> {
        if self.finished {
            return Ok(None);
        }
        loop {
            self.buf.clear();
            match self.inner.read_line(&mut self.buf) {
                Ok(0) => {
                    self.finished = true;
                    return Ok(None);
                }
                Ok(_) => {
                    self.line_number += 1;
                    if !self.buf.trim().is_empty() {
                        return Ok(Some((self.line_number, self.buf.trim())));
                    }
                }
                Err(source) => {
                    self.finished = true;
                    return Err(Error::Io {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }
    }
}

fn niffler_to_io(err: niffler::Error) -> io::Error {
    match err {
        niffler::Error::IOError(e) => e,
        e => io::Error::new(io::ErrorKind::InvalidData, e.to_string()),
    }
}
