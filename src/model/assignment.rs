//! A mapping from variable name to value, used both as the input to evaluation and as the
//! shape of a solution returned by [`Problem::solve`](crate::engine::Problem::solve).

use std::collections::BTreeMap;

use crate::model::Number;
use crate::model::Variable;

/// A (possibly partial) binding of variables to values.
///
/// Keyed by variable name rather than by `Variable` handle: evaluation only ever needs to look a
/// name up, and keying by name keeps an `Assignment` usable for variables the caller doesn't
/// have a live handle to any more (e.g. a solution returned from [`Problem::solve`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    bindings: BTreeMap<String, Number>,
}

impl Assignment {
    pub fn new() -> Self {
        Assignment::default()
    }

    pub fn get(&self, variable: &Variable) -> Option<Number> {
        self.bindings.get(&variable.name()).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<Number> {
        self.bindings.get(name).copied()
    }

    pub fn insert(&mut self, variable: &Variable, value: Number) {
        self.bindings.insert(variable.name(), value);
    }

    pub fn insert_named(&mut self, name: impl Into<String>, value: Number) {
        self.bindings.insert(name.into(), value);
    }

    pub fn contains(&self, variable: &Variable) -> bool {
        self.bindings.contains_key(&variable.name())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Number)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns a new assignment containing every binding of `self`, overlaid with every binding
    /// of `other` (bindings in `other` win on key collision).
    pub fn merged_with(&self, other: &Assignment) -> Assignment {
        let mut merged = self.clone();
        for (name, value) in other.iter() {
            merged.insert_named(name, value);
        }
        merged
    }

    /// Returns the value bound to `name`, if any, as an integer. Used when a caller wants a
    /// concrete `i64` out of a solution rather than a [`Number`].
    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get_by_name(name).and_then(Number::as_i64)
    }
}

impl FromIterator<(String, Number)> for Assignment {
    fn from_iter<T: IntoIterator<Item = (String, Number)>>(iter: T) -> Self {
        Assignment {
            bindings: iter.into_iter().collect(),
        }
    }
}
