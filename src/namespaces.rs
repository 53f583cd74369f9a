use indexmap::IndexSet;

use crate::diagnostics::{Diagnostic, Result};

pub const DEFAULT_NAMESPACES: [&str; 7] = [
    "System",
    "System.Collections.Generic",
    "System.Linq",
    "System.Text",
    "System.Threading.Tasks",
    "System.IO",
    "System.Net.Http",
];

/// Ordered namespaces opened for every execution.
///
/// Behaves like a list: importing a name twice keeps both entries. Only the
/// per-execution view produced by [`NamespaceSet::union`] is deduplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSet {
    names: Vec<String>,
}

impl Default for NamespaceSet {
    fn default() -> Self {
        Self {
            names: DEFAULT_NAMESPACES.iter().map(|ns| ns.to_string()).collect(),
        }
    }
}

impl NamespaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|ns| ns == name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn import<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if names.iter().any(|name| name.as_ref().trim().is_empty()) {
            return Err(Diagnostic::invalid_argument("namespace must not be blank").into());
        }
        for name in names {
            tracing::debug!(namespace = name.as_ref(), "namespace imported");
            self.names.push(name.as_ref().to_string());
        }
        Ok(())
    }

    pub fn remove<S: AsRef<str>>(&mut self, names: &[S]) {
        self.names
            .retain(|ns| !names.iter().any(|name| name.as_ref() == ns.as_str()));
    }

    /// Distinct union with `declared`, in first-seen order. `self` is untouched.
    pub fn union<S: AsRef<str>>(&self, declared: &[S]) -> Vec<String> {
        let merged: IndexSet<&str> = self
            .names
            .iter()
            .map(String::as_str)
            .chain(declared.iter().map(|name| name.as_ref()))
            .collect();
        merged.into_iter().map(str::to_string).collect()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
