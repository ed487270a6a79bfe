//! Name → callable mapping backing named invocation

use std::collections::HashMap;
use std::fmt;

use pyo3::Python;

use super::reference::ForeignObject;

#[derive(Default)]
pub struct FunctionRegistry {
    entries: HashMap<String, ForeignObject>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callable` under `name`.
    ///
    /// Returns the entry it replaces, which the caller must release while
    /// holding the interpreter lock.
    #[must_use = "a superseded entry must be released"]
    pub fn insert(&mut self, name: impl Into<String>, callable: ForeignObject) -> Option<ForeignObject> {
        self.entries.insert(name.into(), callable)
    }

    pub fn get(&self, name: &str) -> Option<&ForeignObject> {
        self.entries.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ForeignObject> {
        self.entries.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every entry; returns how many were dropped
    pub fn clear(&mut self, py: Python<'_>) -> usize {
        let count = self.entries.len();
        for (_, callable) in self.entries.drain() {
            callable.release(py);
        }
        count
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("names", &self.names())
            .finish()
    }
}
