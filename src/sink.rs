//! Terminal actions: drain a pipeline for a side effect, then close it.
//!
//! Every action closes the whole chain, on success and on failure. A failure
//! part-way through a drain aborts it; output already written stays written.

use crate::element::Render;
use crate::pipeline::Pipeline;
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl<T> Pipeline<T> {
    /// Fold the sequence left to right with a fallible `combine`.
    pub fn try_reduce<A, F>(mut self, seed: A, mut combine: F) -> Result<A>
    where
        F: FnMut(A, T) -> Result<A>,
    {
        let mut acc = seed;
        loop {
            let element = match self.pull() {
                Ok(Some(element)) => element,
                Ok(None) => break,
                Err(e) => return self.abort(e),
            };
            acc = match combine(acc, element) {
                Ok(next) => next,
                Err(e) => return self.abort(e),
            };
        }
        self.close()?;
        Ok(acc)
    }

    /// Fold the sequence left to right, starting from `seed`.
    pub fn reduce<A, F>(self, seed: A, mut combine: F) -> Result<A>
    where
        F: FnMut(A, T) -> A,
    {
        self.try_reduce(seed, move |acc, element| Ok(combine(acc, element)))
    }

    /// Number of elements in the sequence.
    pub fn count(self) -> Result<usize> {
        self.reduce(0, |count, _| count + 1)
    }

    /// Drain into a vector.
    pub fn collect_vec(self) -> Result<Vec<T>> {
        self.reduce(Vec::new(), |mut elements, element| {
            elements.push(element);
            elements
        })
    }

    /// Drain both pipelines and compare them element-wise.
    pub fn equals(self, other: Pipeline<T>) -> Result<bool>
    where
        T: PartialEq,
    {
        let left = self.collect_vec()?;
        let right = other.collect_vec()?;
        Ok(left == right)
    }

    fn abort<A>(mut self, error: Error) -> Result<A> {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "close failed after aborted drain");
        }
        Err(error)
    }
}

impl<T: Render> Pipeline<T> {
    /// Write each element verbatim to `writer`. Returns the element count.
    pub fn write_into<W: Write>(self, writer: &mut W) -> Result<usize> {
        let count = self.try_reduce(0, |count, element| {
            writer.write_all(element.render().as_bytes())?;
            Ok(count + 1)
        })?;
        writer.flush()?;
        Ok(count)
    }

    /// Write to a new file at `path`, or replace the source file if `None`.
    pub fn write(self, path: Option<&Path>) -> Result<usize> {
        match path {
            Some(path) => self.write_to(path),
            None => self.write_in_place(),
        }
    }

    /// Write every element to a newly created file at `path`.
    pub fn write_to(self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::open(path, e))?;
        let count = self.write_into(&mut BufWriter::new(file))?;
        tracing::debug!(path = %path.display(), count, "wrote pipeline output");
        Ok(count)
    }

    /// Replace the file this pipeline reads from with its output.
    ///
    /// Output goes to a temporary file in the same directory. Once the
    /// chain is drained and closed, the temporary file is renamed over the
    /// source, so the source is never missing or half-written.
    pub fn write_in_place(self) -> Result<usize> {
        let Some(path) = self.source_path().map(|p| p.to_path_buf()) else {
            return Err(Error::NoSourcePath);
        };
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };

        let mut temp = NamedTempFile::new_in(&dir)?;
        if let Ok(metadata) = fs::metadata(&path) {
            temp.as_file().set_permissions(metadata.permissions())?;
        }
        let count = self.write_into(&mut BufWriter::new(&mut temp))?;

        temp.persist(&path).map_err(|e| Error::Persist {
            path: path.clone(),
            source: e.error,
        })?;
        tracing::debug!(path = %path.display(), count, "replaced file in place");
        Ok(count)
    }

    /// Print every element to standard output.
    pub fn display(self) -> Result<()> {
        let stdout = io::stdout();
        self.write_into(&mut stdout.lock())?;
        Ok(())
    }
}
