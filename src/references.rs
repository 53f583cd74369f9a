use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::diagnostics::{Diagnostic, Result};

/// File name of the orchestrator's own implementation binary.
pub const CORE_ARTIFACT: &str = "Scriptum.Core.dll";
/// File name of the contracts binary shipped next to the core.
pub const CONTRACTS_ARTIFACT: &str = "Scriptum.Contracts.dll";

/// Artifacts that never enter a reference set through `add`.
pub const RESERVED_ARTIFACTS: [&str; 2] = [CORE_ARTIFACT, CONTRACTS_ARTIFACT];

pub const DEFAULT_REFERENCES: [&str; 8] = [
    "System",
    "System.Core",
    "System.Data",
    "System.Data.DataSetExtensions",
    "System.Xml",
    "System.Xml.Linq",
    CORE_ARTIFACT,
    CONTRACTS_ARTIFACT,
];

/// An in-process binary reference: a logical name plus the location it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceHandle {
    pub name: String,
    pub location: PathBuf,
}

impl ReferenceHandle {
    pub fn new(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
        }
    }
}

/// Returns true when `candidate` names one of the reserved artifacts.
///
/// Only the final path component is compared, case-insensitively, so
/// `C:\tools\SCRIPTUM.CORE.DLL` and `bin/Scriptum.Core.dll` both match.
pub fn is_reserved(candidate: &Path) -> bool {
    let name = normalized_file_name(candidate);
    RESERVED_ARTIFACTS
        .iter()
        .any(|reserved| name == reserved.to_lowercase())
}

fn normalized_file_name(path: &Path) -> String {
    // Windows-style separators are not split by `Path` on unix hosts.
    let raw = path.to_string_lossy();
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    last.trim().to_lowercase()
}

/// Binary references handed to every execution, by handle and by path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSet {
    handles: IndexSet<ReferenceHandle>,
    paths: IndexSet<String>,
}

impl Default for ReferenceSet {
    fn default() -> Self {
        Self {
            handles: IndexSet::new(),
            paths: DEFAULT_REFERENCES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn handles(&self) -> impl Iterator<Item = &ReferenceHandle> {
        self.handles.iter()
    }

    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn contains_handle(&self, handle: &ReferenceHandle) -> bool {
        self.handles.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.paths.len() + self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add_paths<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<()> {
        for path in paths {
            if path.as_ref().trim().is_empty() {
                return Err(Diagnostic::invalid_argument("reference path must not be blank").into());
            }
        }
        for path in paths {
            let path = path.as_ref();
            if is_reserved(Path::new(path)) {
                tracing::debug!(path, "skipping reserved reference");
                continue;
            }
            if self.paths.insert(path.to_string()) {
                tracing::debug!(path, "reference added");
            }
        }
        Ok(())
    }

    pub fn add_handles(&mut self, handles: &[ReferenceHandle]) -> Result<()> {
        for handle in handles {
            if handle.location.as_os_str().is_empty() {
                return Err(Diagnostic::invalid_argument(format!(
                    "reference handle `{}` has no location",
                    handle.name
                ))
                .into());
            }
        }
        for handle in handles {
            if is_reserved(&handle.location) {
                tracing::debug!(name = %handle.name, "skipping reserved reference handle");
                continue;
            }
            self.handles.insert(handle.clone());
        }
        Ok(())
    }

    pub fn remove_paths<S: AsRef<str>>(&mut self, paths: &[S]) {
        for path in paths {
            self.paths.shift_remove(path.as_ref());
        }
    }

    pub fn remove_handles(&mut self, handles: &[ReferenceHandle]) {
        for handle in handles {
            self.handles.shift_remove(handle);
        }
    }

    /// Unions references declared by a pre-processed script. No reserved-artifact
    /// filtering happens here.
    pub fn merge<S: AsRef<str>>(&mut self, declared: &[S]) {
        for path in declared {
            self.paths.insert(path.as_ref().to_string());
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
