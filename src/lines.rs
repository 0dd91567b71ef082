//! Line and field combinators.
//!
//! These are specializations of `map` and `filter` for line pipelines
//! (`Pipeline<String>`) and tuple pipelines (`Pipeline<Fields>`). Pattern
//! compile errors and bad field indices never fail at construction; they
//! surface on the first pull that needs them.

use crate::element::Fields;
use crate::pipeline::Pipeline;
use crate::{Error, Result};
use regex::Regex;

/// A regular expression whose compile error is reported lazily.
///
/// Matching ignores one trailing `\n`, so `$` anchors before a line's
/// terminator: `\r$` finds the carriage return of a CRLF line.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: std::result::Result<Regex, regex::Error>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            compiled: Regex::new(pattern),
        }
    }

    /// The compiled expression, or the compile error.
    pub fn regex(&self) -> Result<&Regex> {
        self.compiled.as_ref().map_err(|e| Error::Pattern {
            pattern: self.source.clone(),
            source: e.clone(),
        })
    }

    /// True if the pattern matches at the start of `text`.
    pub fn matches_start(&self, text: &str) -> Result<bool> {
        let (body, _) = split_terminator(text);
        Ok(self.regex()?.find(body).is_some_and(|m| m.start() == 0))
    }

    /// True if the pattern matches anywhere in `text`.
    pub fn is_found_in(&self, text: &str) -> Result<bool> {
        let (body, _) = split_terminator(text);
        Ok(self.regex()?.is_match(body))
    }

    /// Replace every non-overlapping match, keeping the line terminator.
    pub fn replace_all(&self, text: &str, replacement: &str) -> Result<String> {
        let (body, terminator) = split_terminator(text);
        let mut replaced = self.regex()?.replace_all(body, replacement).into_owned();
        replaced.push_str(terminator);
        Ok(replaced)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

fn split_terminator(text: &str) -> (&str, &str) {
    match text.strip_suffix('\n') {
        Some(body) => (body, "\n"),
        None => (text, ""),
    }
}

fn field_at(fields: &Fields, index: usize) -> Result<&String> {
    fields.get(index).ok_or(Error::FieldIndex {
        index,
        arity: fields.len(),
    })
}

impl Pipeline<String> {
    /// Replace every non-overlapping match of `pattern` in each line.
    ///
    /// `replacement` may reference groups as `$1` or `${name}`.
    pub fn substitute(self, pattern: &str, replacement: &str) -> Pipeline<String> {
        let pattern = Pattern::new(pattern);
        let replacement = replacement.to_string();
        self.try_map(move |line| pattern.replace_all(&line, &replacement))
    }

    /// Split each line into fields on `delimiter`.
    ///
    /// The line terminator stays on the last field, so `join` with the same
    /// delimiter restores the line.
    pub fn split(self, delimiter: &str) -> Pipeline<Fields> {
        let delimiter = delimiter.to_string();
        self.try_map(move |line| {
            if delimiter.is_empty() {
                return Err(Error::Config("split delimiter must not be empty".into()));
            }
            Ok(line.split(delimiter.as_str()).map(String::from).collect())
        })
    }

    /// Keep lines where `pattern` matches at the start.
    pub fn keep_if_matches(self, pattern: &str) -> Pipeline<String> {
        let pattern = Pattern::new(pattern);
        self.try_filter(move |line| pattern.matches_start(line))
    }

    /// Drop lines where `pattern` matches at the start.
    pub fn drop_if_matches(self, pattern: &str) -> Pipeline<String> {
        let pattern = Pattern::new(pattern);
        self.try_filter(move |line| Ok(!pattern.matches_start(line)?))
    }

    /// Keep lines where `pattern` matches anywhere.
    pub fn keep_if_contains(self, pattern: &str) -> Pipeline<String> {
        let pattern = Pattern::new(pattern);
        self.try_filter(move |line| pattern.is_found_in(line))
    }

    /// Drop lines where `pattern` matches anywhere.
    pub fn drop_if_contains(self, pattern: &str) -> Pipeline<String> {
        let pattern = Pattern::new(pattern);
        self.try_filter(move |line| Ok(!pattern.is_found_in(line)?))
    }
}

impl Pipeline<Fields> {
    /// Join each tuple's fields into one line.
    pub fn join(self, delimiter: &str) -> Pipeline<String> {
        let delimiter = delimiter.to_string();
        self.map(move |fields| fields.join(&delimiter))
    }

    /// Replace field `index` with `transform` of its value.
    pub fn map_on_field<F>(self, index: usize, mut transform: F) -> Pipeline<Fields>
    where
        F: FnMut(String) -> String + 'static,
    {
        self.try_map(move |mut fields| {
            field_at(&fields, index)?;
            let value = std::mem::take(&mut fields[index]);
            fields[index] = transform(value);
            Ok(fields)
        })
    }

    /// Replace field `index` with the parts `transform` returns.
    ///
    /// The parts are spliced in place, so the arity changes unless exactly
    /// one part comes back.
    pub fn splice_on_field<F>(self, index: usize, mut transform: F) -> Pipeline<Fields>
    where
        F: FnMut(String) -> Vec<String> + 'static,
    {
        self.try_map(move |mut fields| {
            field_at(&fields, index)?;
            let value = std::mem::take(&mut fields[index]);
            let parts = transform(value);
            fields.splice(index..=index, parts);
            Ok(fields)
        })
    }

    /// Select field `index` as a line of its own.
    pub fn field(self, index: usize) -> Pipeline<String> {
        self.try_map(move |fields| Ok(format!("{}\n", field_at(&fields, index)?)))
    }

    /// Keep the given fields, in the order `indices` lists them.
    pub fn keep_fields(self, indices: &[usize]) -> Pipeline<Fields> {
        let indices = indices.to_vec();
        self.try_map(move |fields| {
            indices
                .iter()
                .map(|&index| field_at(&fields, index).cloned())
                .collect()
        })
    }

    /// Drop the given fields, keeping the rest in their original order.
    ///
    /// Indices past the end of a tuple are ignored.
    pub fn drop_fields(self, indices: &[usize]) -> Pipeline<Fields> {
        let indices = indices.to_vec();
        self.map(move |fields| {
            fields
                .into_iter()
                .enumerate()
                .filter(|(index, _)| !indices.contains(index))
                .map(|(_, field)| field)
                .collect()
        })
    }

    /// Keep tuples whose field `index` satisfies `predicate`.
    pub fn keep_on_field<P>(self, index: usize, mut predicate: P) -> Pipeline<Fields>
    where
        P: FnMut(&str) -> bool + 'static,
    {
        self.try_filter(move |fields| Ok(predicate(field_at(fields, index)?.as_str())))
    }

    /// Drop tuples whose field `index` satisfies `predicate`.
    pub fn drop_on_field<P>(self, index: usize, mut predicate: P) -> Pipeline<Fields>
    where
        P: FnMut(&str) -> bool + 'static,
    {
        self.try_filter(move |fields| Ok(!predicate(field_at(fields, index)?.as_str())))
    }

    pub fn keep_if_field_matches(self, index: usize, pattern: &str) -> Pipeline<Fields> {
        let pattern = Pattern::new(pattern);
        self.try_filter(move |fields| pattern.matches_start(field_at(fields, index)?))
    }

    pub fn drop_if_field_matches(self, index: usize, pattern: &str) -> Pipeline<Fields> {
        let pattern = Pattern::new(pattern);
        self.try_filter(move |fields| Ok(!pattern.matches_start(field_at(fields, index)?)?))
    }

    pub fn keep_if_field_contains(self, index: usize, pattern: &str) -> Pipeline<Fields> {
        let pattern = Pattern::new(pattern);
        self.try_filter(move |fields| pattern.is_found_in(field_at(fields, index)?))
    }

    pub fn drop_if_field_contains(self, index: usize, pattern: &str) -> Pipeline<Fields> {
        let pattern = Pattern::new(pattern);
        self.try_filter(move |fields| Ok(!pattern.is_found_in(field_at(fields, index)?)?))
    }
}
