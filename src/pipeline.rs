//! The pipeline node: a lazy element producer plus its ownership chain.
//!
//! A [`Pipeline`] wraps one boxed [`Stage`]. Root pipelines are built by the
//! factories ([`Pipeline::open`], [`Pipeline::tail`],
//! [`Pipeline::from_values`]) and own a file, a temporary file, or an
//! in-memory sequence. Derived pipelines own their parent(s) through their
//! stage, so closing the tip of a chain tears down every ancestor exactly
//! once.
//!
//! ```
//! use linemunge::Pipeline;
//!
//! let words = Pipeline::from_values(vec![
//!     "abc".to_string(),
//!     "abd".to_string(),
//!     "bcd".to_string(),
//! ]);
//! assert_eq!(words.keep_if_contains("ab").count().unwrap(), 2);
//! ```

use crate::Result;
use crate::source::{IterSource, LineSource};
use crate::stage::{FilterStage, MapStage, Stage};
use crate::tail::{TailOptions, TailSource};
use std::path::{Path, PathBuf};

/// A lazy, single-pass, pull-based element producer.
pub struct Pipeline<T> {
    stage: Box<dyn Stage<Item = T>>,
    path: Option<PathBuf>,
    finished: bool,
    closed: bool,
}

impl Pipeline<String> {
    /// Read the lines of an existing file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = LineSource::open(path)?;
        Ok(Self::from_stage(source, Some(path.to_path_buf())))
    }

    /// Follow lines appended to `path`, polling every 10ms, until cancelled.
    pub fn tail(path: impl AsRef<Path>) -> Result<Self> {
        Self::tail_with(path, TailOptions::default())
    }

    /// Follow lines appended to `path` with explicit options.
    pub fn tail_with(path: impl AsRef<Path>, options: TailOptions) -> Result<Self> {
        let path = path.as_ref();
        let source = TailSource::open(path, options)?;
        Ok(Self::from_stage(source, Some(path.to_path_buf())))
    }
}

impl<T> Pipeline<T> {
    /// Wrap a stage. `path` is the file the chain ultimately reads from.
    pub fn from_stage<S>(stage: S, path: Option<PathBuf>) -> Self
    where
        S: Stage<Item = T> + 'static,
    {
        Self {
            stage: Box::new(stage),
            path,
            finished: false,
            closed: false,
        }
    }

    /// Pull the next element.
    ///
    /// After the sequence ends or a pull fails, every further pull returns
    /// `Ok(None)`.
    pub fn pull(&mut self) -> Result<Option<T>> {
        if self.finished || self.closed {
            return Ok(None);
        }
        let next = self.stage.pull();
        if !matches!(next, Ok(Some(_))) {
            self.finished = true;
        }
        next
    }

    /// Release this pipeline's resources and those of all its ancestors.
    ///
    /// Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        tracing::debug!(stage = self.stage.name(), "closing");
        self.stage.close()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The file this chain reads from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn stage_name(&self) -> &str {
        self.stage.name()
    }
}

impl<T: 'static> Pipeline<T> {
    /// A pipeline over an in-memory sequence.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self::from_stage(IterSource::new(values.into_iter()), None)
    }

    /// Apply `transform` to every element, lazily.
    pub fn map<U, F>(self, mut transform: F) -> Pipeline<U>
    where
        F: FnMut(T) -> U + 'static,
    {
        self.try_map(move |element| Ok(transform(element)))
    }

    /// Apply a fallible `transform`; its first error ends the sequence.
    pub fn try_map<U, F>(self, transform: F) -> Pipeline<U>
    where
        F: FnMut(T) -> Result<U> + 'static,
    {
        let path = self.path.clone();
        Pipeline::from_stage(MapStage::new(self, transform), path)
    }

    /// Keep only elements for which `predicate` holds.
    pub fn filter<P>(self, mut predicate: P) -> Pipeline<T>
    where
        P: FnMut(&T) -> bool + 'static,
    {
        self.try_filter(move |element| Ok(predicate(element)))
    }

    /// Keep elements selected by a fallible `predicate`.
    pub fn try_filter<P>(self, predicate: P) -> Pipeline<T>
    where
        P: FnMut(&T) -> Result<bool> + 'static,
    {
        let path = self.path.clone();
        Pipeline::from_stage(FilterStage::new(self, predicate), path)
    }

    /// Alias of [`Pipeline::filter`].
    pub fn keep<P>(self, predicate: P) -> Pipeline<T>
    where
        P: FnMut(&T) -> bool + 'static,
    {
        self.filter(predicate)
    }

    /// Discard elements for which `predicate` holds.
    pub fn drop_if<P>(self, mut predicate: P) -> Pipeline<T>
    where
        P: FnMut(&T) -> bool + 'static,
    {
        self.filter(move |element| !predicate(element))
    }
}

impl<T: 'static> FromIterator<T> for Pipeline<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_values(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T> Drop for Pipeline<T> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(stage = self.stage.name(), error = %e, "close failed during drop");
        }
    }
}

/// Iterator over a pipeline's pulls.
pub struct Elements<T> {
    pipeline: Pipeline<T>,
}

impl<T> Iterator for Elements<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        self.pipeline.pull().transpose()
    }
}

impl<T> IntoIterator for Pipeline<T> {
    type Item = Result<T>;
    type IntoIter = Elements<T>;

    fn into_iter(self) -> Elements<T> {
        Elements { pipeline: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Stage that counts how often it was closed.
    struct Probe {
        values: Vec<i32>,
        closes: Rc<Cell<usize>>,
    }

    impl Stage for Probe {
        type Item = i32;

        fn pull(&mut self) -> Result<Option<i32>> {
            Ok(if self.values.is_empty() {
                None
            } else {
                Some(self.values.remove(0))
            })
        }

        fn close(&mut self) -> Result<()> {
            self.closes.set(self.closes.get() + 1);
            Ok(())
        }

        fn name(&self) -> &str {
            "PROBE"
        }
    }

    fn probe(values: Vec<i32>) -> (Pipeline<i32>, Rc<Cell<usize>>) {
        let closes = Rc::new(Cell::new(0));
        let stage = Probe {
            values,
            closes: Rc::clone(&closes),
        };
        (Pipeline::from_stage(stage, None), closes)
    }

    #[test]
    fn test_map_is_lazy() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let mut mapped = Pipeline::from_values(vec![1, 2, 3]).map(move |x| {
            seen.set(seen.get() + 1);
            x + 1
        });
        assert_eq!(calls.get(), 0);
        assert_eq!(mapped.pull().unwrap(), Some(2));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_filter_preserves_order() {
        let out = Pipeline::from_values(1..=10)
            .filter(|x| x % 3 == 0)
            .collect_vec()
            .unwrap();
        assert_eq!(out, vec![3, 6, 9]);
    }

    #[test]
    fn test_drop_if_negates() {
        let out = Pipeline::from_values(1..=5)
            .drop_if(|x| *x > 2)
            .collect_vec()
            .unwrap();
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn test_close_cascades_once() {
        let (root, closes) = probe(vec![1, 2]);
        let mut tip = root.map(|x| x * 2).filter(|x| *x > 0);
        tip.close().unwrap();
        tip.close().unwrap();
        assert_eq!(closes.get(), 1);
        assert!(tip.is_closed());
    }

    #[test]
    fn test_drop_closes_chain() {
        let (root, closes) = probe(vec![1]);
        let tip = root.map(|x| x + 1);
        drop(tip);
        assert_eq!(closes.get(), 1);
    }

    #[test]
    fn test_pull_after_close_is_empty() {
        let (mut root, _) = probe(vec![1, 2]);
        root.close().unwrap();
        assert_eq!(root.pull().unwrap(), None);
    }

    #[test]
    fn test_error_terminates_sequence() {
        let mut tip = Pipeline::from_values(vec![1, 2, 3]).try_map(|x| {
            if x == 2 {
                Err(Error::Config("boom".to_string()))
            } else {
                Ok(x)
            }
        });
        assert_eq!(tip.pull().unwrap(), Some(1));
        assert!(tip.pull().is_err());
        assert_eq!(tip.pull().unwrap(), None);
    }

    #[test]
    fn test_into_iter_yields_results() {
        let out: Result<Vec<i32>> = Pipeline::from_values(vec![4, 5]).into_iter().collect();
        assert_eq!(out.unwrap(), vec![4, 5]);
    }

    #[test]
    fn test_from_iterator() {
        let pipeline: Pipeline<i32> = (0..3).collect();
        assert_eq!(pipeline.count().unwrap(), 3);
    }

    #[test]
    fn test_derived_nodes_carry_source_path() {
        let values = IterSource::new(vec!["x".to_string()].into_iter());
        let root = Pipeline::from_stage(values, Some(PathBuf::from("/tmp/data.txt")));
        let tip = root.map(|s| s.to_uppercase()).keep(|s| !s.is_empty());
        assert_eq!(tip.source_path(), Some(Path::new("/tmp/data.txt")));
    }

    #[test]
    fn test_open_missing_file_fails_immediately() {
        let result = Pipeline::open("/definitely/not/here.txt");
        assert!(matches!(result, Err(Error::Open { .. })));
    }
}
