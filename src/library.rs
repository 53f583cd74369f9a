use std::path::Path;

use crate::{
    diagnostics::Result,
    filesystem::FileSystem,
    preprocessor::{PreprocessResult, Preprocessor},
    session::SessionState,
};

/// Names the shared library bundle looked up in the packages folder.
pub trait LibraryComposer {
    fn library_file_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptLibraryComposer;

impl ScriptLibraryComposer {
    pub const FILE_NAME: &'static str = "ScriptLibraries.csx";
}

impl LibraryComposer for ScriptLibraryComposer {
    fn library_file_name(&self) -> &str {
        Self::FILE_NAME
    }
}

/// Splices the shared library bundle into the first script of a session.
pub struct LibraryInjector<'a> {
    pub fs: &'a dyn FileSystem,
    pub preprocessor: &'a dyn Preprocessor,
    pub composer: &'a dyn LibraryComposer,
}

impl LibraryInjector<'_> {
    /// Returns whether the bundle was spliced into `result`.
    ///
    /// A missing bundle still arms the sentinel: the lookup is not repeated
    /// until the session state is cleared.
    pub fn inject_if_needed(
        &self,
        working_directory: &Path,
        result: &mut PreprocessResult,
        state: &mut SessionState,
    ) -> Result<bool> {
        if state.injected {
            return Ok(false);
        }
        let bundle = working_directory
            .join(self.fs.packages_folder())
            .join(self.composer.library_file_name());
        if !self.fs.exists(&bundle) {
            tracing::debug!(path = %bundle.display(), "no script library bundle");
            state.injected = true;
            return Ok(false);
        }

        let library = self.preprocessor.process_file(&bundle)?;
        result.code = format!("{}\n{}", library.code, result.code);
        result.references.extend(library.references);
        result.namespaces.extend(library.namespaces);
        state.injected = true;
        tracing::debug!(path = %bundle.display(), "script library bundle injected");
        Ok(true)
    }
}
