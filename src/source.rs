//! Root stages: in-memory sequences and file-backed line readers.

use crate::stage::Stage;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tempfile::TempPath;

/// A stage over an in-memory sequence. Owns no resources.
pub struct IterSource<I> {
    iter: I,
}

impl<I: Iterator> IterSource<I> {
    pub fn new(iter: I) -> Self {
        Self { iter }
    }
}

impl<I: Iterator> Stage for IterSource<I> {
    type Item = I::Item;

    fn pull(&mut self) -> Result<Option<I::Item>> {
        Ok(self.iter.next())
    }

    fn name(&self) -> &str {
        "VALUES"
    }
}

/// A sequential line reader over a file.
///
/// Each line keeps its terminator. When built from a sort result the
/// source also owns the temporary file and deletes it on close.
pub struct LineSource {
    name: String,
    reader: Option<BufReader<File>>,
    temp: Option<TempPath>,
}

impl LineSource {
    /// Open `path` for reading.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        tracing::debug!(path = %path.display(), "opened line source");
        Ok(Self {
            name: format!("OPEN {}", path.display()),
            reader: Some(BufReader::new(file)),
            temp: None,
        })
    }

    /// Read back a temporary file, taking ownership of it.
    pub fn from_temp(file: File, temp: TempPath) -> Self {
        Self {
            name: format!("TEMP {}", temp.display()),
            reader: Some(BufReader::new(file)),
            temp: Some(temp),
        }
    }
}

impl Stage for LineSource {
    type Item = String;

    fn pull(&mut self) -> Result<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn close(&mut self) -> Result<()> {
        self.reader.take();
        if let Some(temp) = self.temp.take() {
            tracing::debug!(path = %temp.display(), "removing temporary file");
            temp.close()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
