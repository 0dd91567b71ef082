//! Pull-based stage trait and the derived map/filter stages.
//!
//! A [`Stage`] is the engine behind a [`Pipeline`]: it produces the next
//! element on demand and releases whatever it owns on close. Source stages
//! own a file or an in-memory sequence; derived stages own their parent
//! pipeline(s) and cascade close to them.

use crate::Result;
use crate::pipeline::Pipeline;

/// A lazy, single-pass producer of elements.
pub trait Stage {
    /// The element type this stage yields.
    type Item;

    /// Produce the next element, `Ok(None)` at end of sequence.
    fn pull(&mut self) -> Result<Option<Self::Item>>;

    /// Release owned resources and cascade to ancestors.
    ///
    /// Called at most once by the owning [`Pipeline`].
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// The display name of this stage, used in logs.
    fn name(&self) -> &str;
}

/// Element-wise transform of a parent pipeline.
pub struct MapStage<T, F> {
    parent: Pipeline<T>,
    transform: F,
}

impl<T, F> MapStage<T, F> {
    pub fn new(parent: Pipeline<T>, transform: F) -> Self {
        Self { parent, transform }
    }
}

impl<T, U, F> Stage for MapStage<T, F>
where
    F: FnMut(T) -> Result<U>,
{
    type Item = U;

    fn pull(&mut self) -> Result<Option<U>> {
        match self.parent.pull()? {
            Some(element) => (self.transform)(element).map(Some),
            None => Ok(None),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.parent.close()
    }

    fn name(&self) -> &str {
        "MAP"
    }
}

/// Predicate-selected subset of a parent pipeline.
pub struct FilterStage<T, P> {
    parent: Pipeline<T>,
    predicate: P,
}

impl<T, P> FilterStage<T, P> {
    pub fn new(parent: Pipeline<T>, predicate: P) -> Self {
        Self { parent, predicate }
    }
}

impl<T, P> Stage for FilterStage<T, P>
where
    P: FnMut(&T) -> Result<bool>,
{
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>> {
        while let Some(element) = self.parent.pull()? {
            if (self.predicate)(&element)? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    fn close(&mut self) -> Result<()> {
        self.parent.close()
    }

    fn name(&self) -> &str {
        "FILTER"
    }
}
