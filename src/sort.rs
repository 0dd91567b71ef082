//! Ordering configuration and the disk-backed sort stage.
//!
//! Sorting is not a streaming operation: the upstream sequence is drained,
//! ordered in memory, written one element per line to a temporary file,
//! and the upstream chain is closed. The result is a fresh root pipeline
//! reading that file back, which deletes it when closed.

use crate::element::{Render, render_line};
use crate::pipeline::Pipeline;
use crate::source::LineSource;
use crate::{Error, Result};
use std::cmp::Ordering;
use std::io::{BufWriter, Write};
use tempfile::NamedTempFile;

/// A two-argument ordering function.
pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

/// How elements are ordered by `sort` and `merge`.
///
/// Built from the element type's natural order with [`Order::natural`], or
/// from any two-argument comparator with [`Order::by`], which works for
/// element types without a total order such as `f64`.
pub struct Order<T> {
    comparator: Comparator<T>,
    reverse: Option<bool>,
}

impl<T: Ord + 'static> Order<T> {
    /// Natural ascending order.
    pub fn natural() -> Self {
        Self::by(T::cmp)
    }
}

impl<T: 'static> Order<T> {
    /// Order with a custom comparator.
    pub fn by<F>(comparator: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        Self {
            comparator: Box::new(comparator),
            reverse: None,
        }
    }

    /// Invert the order.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = Some(reverse);
        self
    }

    pub fn is_reversed(&self) -> bool {
        self.reverse.unwrap_or(false)
    }

    fn has_explicit_direction(&self) -> bool {
        self.reverse.is_some()
    }

    /// Resolve into a single comparison function.
    pub(crate) fn into_comparator(self) -> Comparator<T> {
        let base = self.comparator;
        if self.reverse.unwrap_or(false) {
            Box::new(move |a: &T, b: &T| base(b, a))
        } else {
            base
        }
    }
}

impl<T: Ord + 'static> Default for Order<T> {
    fn default() -> Self {
        Self::natural()
    }
}

impl<T: Render + 'static> Pipeline<T> {
    /// Drain, order and re-open the sequence from a temporary file.
    ///
    /// The result carries this chain's source path, so an in-place write
    /// after a sort replaces the original file.
    pub fn sort(mut self, order: Order<T>) -> Result<Pipeline<String>> {
        let compare = order.into_comparator();
        let mut elements = Vec::new();
        while let Some(element) = self.pull()? {
            elements.push(element);
        }
        elements.sort_unstable_by(|a, b| compare(a, b));

        let mut temp = NamedTempFile::new()?;
        {
            let mut writer = BufWriter::new(&mut temp);
            for element in &elements {
                writer.write_all(render_line(element).as_bytes())?;
            }
            writer.flush()?;
        }
        let reader = temp.reopen()?;
        let temp = temp.into_temp_path();
        tracing::debug!(
            count = elements.len(),
            path = %temp.display(),
            "sorted into temporary file"
        );

        self.close()?;
        let path = self.source_path().map(|p| p.to_path_buf());
        Ok(Pipeline::from_stage(LineSource::from_temp(reader, temp), path))
    }

    /// Sort ascending. Setting a direction on `order` is an error.
    pub fn sort_ascending(self, order: Order<T>) -> Result<Pipeline<String>> {
        if order.has_explicit_direction() {
            return Err(Error::Config(
                "sort_ascending does not accept a reverse flag".into(),
            ));
        }
        self.sort(order)
    }

    /// Sort descending. Setting a direction on `order` is an error.
    pub fn sort_descending(self, order: Order<T>) -> Result<Pipeline<String>> {
        if order.has_explicit_direction() {
            return Err(Error::Config(
                "sort_descending does not accept a reverse flag".into(),
            ));
        }
        self.sort(order.reverse(true))
    }
}
