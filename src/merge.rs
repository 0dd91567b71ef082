//! K-way merge of pre-sorted pipelines.
//!
//! Each input must already be non-decreasing under the merge order. This is
//! not checked; unsorted inputs give an output whose order is unspecified.

use crate::Result;
use crate::pipeline::Pipeline;
use crate::sort::{Comparator, Order};
use crate::stage::Stage;
use std::cmp::Ordering;

/// Merges the heads of several ordered inputs.
///
/// Heads are selected by linear scan, O(k) comparisons per element. Ties go
/// to the input listed first.
pub struct MergeStage<T> {
    inputs: Vec<Pipeline<T>>,
    heads: Vec<Option<T>>,
    primed: bool,
    compare: Comparator<T>,
}

impl<T: 'static> MergeStage<T> {
    pub fn new(inputs: Vec<Pipeline<T>>, order: Order<T>) -> Self {
        Self {
            heads: Vec::with_capacity(inputs.len()),
            inputs,
            primed: false,
            compare: order.into_comparator(),
        }
    }
}

impl<T> MergeStage<T> {
    fn prime(&mut self) -> Result<()> {
        for input in &mut self.inputs {
            self.heads.push(input.pull()?);
        }
        self.primed = true;
        Ok(())
    }

    fn min_head(&self) -> Option<usize> {
        let mut best: Option<(usize, &T)> = None;
        for (index, head) in self.heads.iter().enumerate() {
            if let Some(candidate) = head
                && best.is_none_or(|(_, current)| {
                    (self.compare)(candidate, current) == Ordering::Less
                })
            {
                best = Some((index, candidate));
            }
        }
        best.map(|(index, _)| index)
    }
}

impl<T> Stage for MergeStage<T> {
    type Item = T;

    fn pull(&mut self) -> Result<Option<T>> {
        if !self.primed {
            self.prime()?;
        }
        let Some(index) = self.min_head() else {
            return Ok(None);
        };
        let element = self.heads[index].take();
        self.heads[index] = self.inputs[index].pull()?;
        if self.heads[index].is_none() {
            tracing::debug!(input = index, "merge input exhausted");
        }
        Ok(element)
    }

    fn close(&mut self) -> Result<()> {
        let mut first_error = None;
        for input in &mut self.inputs {
            if let Err(e) = input.close()
                && first_error.is_none()
            {
                first_error = Some(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn name(&self) -> &str {
        "MERGE"
    }
}

impl<T: 'static> Pipeline<T> {
    /// Merge already-ordered pipelines into one ordered pipeline.
    ///
    /// Closing the result closes every input.
    pub fn merge(inputs: Vec<Pipeline<T>>, order: Order<T>) -> Pipeline<T> {
        tracing::debug!(inputs = inputs.len(), "merging");
        Pipeline::from_stage(MergeStage::new(inputs, order), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Input whose close is counted and optionally fails.
    struct Closing {
        closes: Rc<Cell<usize>>,
        fail: bool,
    }

    impl Stage for Closing {
        type Item = i32;

        fn pull(&mut self) -> Result<Option<i32>> {
            Ok(None)
        }

        fn close(&mut self) -> Result<()> {
            self.closes.set(self.closes.get() + 1);
            if self.fail {
                Err(Error::Config("close failed".into()))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            "CLOSING"
        }
    }

    fn values(items: &[i32]) -> Pipeline<i32> {
        Pipeline::from_values(items.to_vec())
    }

    #[test]
    fn test_merge_2() {
        let out = Pipeline::merge(
            vec![values(&[1, 3, 5, 7]), values(&[2, 4, 6, 8])],
            Order::natural(),
        );
        assert_eq!(out.collect_vec().unwrap(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_merge_3() {
        let out = Pipeline::merge(
            vec![
                values(&[1, 3, 5, 7]),
                values(&[2, 4, 6, 8]),
                values(&[0, 3, 6, 9]),
            ],
            Order::natural(),
        );
        assert_eq!(
            out.collect_vec().unwrap(),
            vec![0, 1, 2, 3, 3, 4, 5, 6, 6, 7, 8, 9]
        );
    }

    #[test]
    fn test_ties_go_to_first_input() {
        let tagged = |items: &[(i32, char)]| Pipeline::from_values(items.to_vec());
        let by_key = Order::by(|a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0));
        let out = Pipeline::merge(
            vec![tagged(&[(1, 'a'), (2, 'a')]), tagged(&[(1, 'b'), (2, 'b')])],
            by_key,
        );
        assert_eq!(
            out.collect_vec().unwrap(),
            vec![(1, 'a'), (1, 'b'), (2, 'a'), (2, 'b')]
        );
    }

    #[test]
    fn test_merge_descending_inputs() {
        let out = Pipeline::merge(
            vec![values(&[9, 5, 1]), values(&[8, 2])],
            Order::natural().reverse(true),
        );
        assert_eq!(out.collect_vec().unwrap(), vec![9, 8, 5, 2, 1]);
    }

    #[test]
    fn test_merge_with_empty_inputs() {
        let out = Pipeline::merge(vec![values(&[]), values(&[4]), values(&[])], Order::natural());
        assert_eq!(out.collect_vec().unwrap(), vec![4]);
        let none: Pipeline<i32> = Pipeline::merge(vec![], Order::natural());
        assert_eq!(none.count().unwrap(), 0);
    }

    #[test]
    fn test_merge_is_lazy() {
        let failing = Pipeline::from_values(vec![1]).try_map(|_: i32| -> Result<i32> {
            Err(Error::Config("pulled".into()))
        });
        let mut merged = Pipeline::merge(vec![failing], Order::natural());
        // Nothing is pulled until the merge itself is pulled.
        assert!(merged.pull().is_err());
    }

    #[test]
    fn test_merge_has_no_source_path() {
        let merged = Pipeline::merge(vec![values(&[1])], Order::natural());
        assert!(merged.source_path().is_none());
    }

    #[test]
    fn test_close_reaches_every_input_once() {
        let closes: Vec<Rc<Cell<usize>>> = (0..3).map(|_| Rc::new(Cell::new(0))).collect();
        let inputs = closes
            .iter()
            .enumerate()
            .map(|(index, count)| {
                let stage = Closing {
                    closes: Rc::clone(count),
                    fail: index == 1,
                };
                Pipeline::from_stage(stage, None)
            })
            .collect();
        let mut merged = Pipeline::merge(inputs, Order::natural());

        assert!(matches!(merged.close(), Err(Error::Config(_))));
        merged.close().unwrap();
        drop(merged);
        assert!(closes.iter().all(|count| count.get() == 1));
    }

    #[test]
    fn test_merge_floats_with_total_cmp() {
        let floats = |items: &[f64]| Pipeline::from_values(items.to_vec());
        let out = Pipeline::merge(
            vec![floats(&[0.5, 2.25]), floats(&[-1.0, 0.5, 3.0])],
            Order::by(f64::total_cmp),
        );
        assert_eq!(out.collect_vec().unwrap(), vec![-1.0, 0.5, 0.5, 2.25, 3.0]);
    }
}
