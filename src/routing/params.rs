//! Per-request parameter binding slot.

use std::sync::{Arc, OnceLock};

/// Path parameters bound by the last match.
///
/// Names and values are parallel sequences in the order the pattern
/// declares them. The slot is owned by one request and reset, not
/// reallocated, before every match attempt.
#[derive(Debug, Clone)]
pub struct Params {
    names: Arc<[String]>,
    values: Vec<String>,
}

/// Shared empty name list.
fn no_names() -> Arc<[String]> {
    static EMPTY: OnceLock<Arc<[String]>> = OnceLock::new();
    Arc::clone(EMPTY.get_or_init(|| Arc::from(Vec::new())))
}

impl Default for Params {
    fn default() -> Self {
        Self {
            names: no_names(),
            values: Vec::new(),
        }
    }
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all bindings, keeping the value buffer's capacity. Never
    /// allocates: the empty name list is shared process-wide.
    pub fn reset(&mut self) {
        if !self.names.is_empty() {
            self.names = no_names();
        }
        self.values.clear();
    }

    /// Ordered parameter names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Ordered parameter values.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    /// Value at position `index`.
    pub fn at(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(name, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    /// Bind the names of the matched endpoint and the captured slices.
    pub(crate) fn bind<'p>(&mut self, names: &Arc<[String]>, values: impl Iterator<Item = &'p str>) {
        self.names = Arc::clone(names);
        self.values.clear();
        self.values.extend(values.map(str::to_string));
    }

    /// Overwrite bindings directly. Used by request handling layers that
    /// restore a context outside of a match.
    pub fn set(&mut self, names: Vec<String>, values: Vec<String>) {
        self.names = Arc::from(names);
        self.values = values;
    }
}
