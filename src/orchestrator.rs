use std::{path::Path, rc::Rc};

use crate::{
    diagnostics::{Diagnostic, Result},
    engine::{ExecutionRequest, ExecutionResult, ScriptEngine},
    filesystem::FileSystem,
    library::{LibraryComposer, LibraryInjector},
    namespaces::NamespaceSet,
    preprocessor::{PreprocessResult, Preprocessor},
    references::{ReferenceHandle, ReferenceSet},
    session::{ExecutionSession, ScriptPack},
};

enum Lifecycle {
    Uninitialized,
    Initialized(ExecutionSession),
    Terminated,
}

/// Coarse view of where an orchestrator is in its session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Terminated,
}

pub struct Orchestrator {
    fs: Rc<dyn FileSystem>,
    preprocessor: Box<dyn Preprocessor>,
    engine: Box<dyn ScriptEngine>,
    composer: Box<dyn LibraryComposer>,
    references: ReferenceSet,
    namespaces: NamespaceSet,
    lifecycle: Lifecycle,
}

impl Orchestrator {
    pub fn new(
        fs: Rc<dyn FileSystem>,
        preprocessor: Box<dyn Preprocessor>,
        engine: Box<dyn ScriptEngine>,
        composer: Box<dyn LibraryComposer>,
    ) -> Self {
        Self {
            fs,
            preprocessor,
            engine,
            composer,
            references: ReferenceSet::default(),
            namespaces: NamespaceSet::default(),
            lifecycle: Lifecycle::Uninitialized,
        }
    }

    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    pub fn namespaces(&self) -> &NamespaceSet {
        &self.namespaces
    }

    pub fn phase(&self) -> Phase {
        match self.lifecycle {
            Lifecycle::Uninitialized => Phase::Uninitialized,
            Lifecycle::Initialized(_) => Phase::Initialized,
            Lifecycle::Terminated => Phase::Terminated,
        }
    }

    pub fn session(&self) -> Option<&ExecutionSession> {
        match &self.lifecycle {
            Lifecycle::Initialized(session) => Some(session),
            _ => None,
        }
    }

    pub fn add_references(&mut self, handles: &[ReferenceHandle]) -> Result<()> {
        self.references.add_handles(handles)
    }

    pub fn add_reference_paths<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<()> {
        self.references.add_paths(paths)
    }

    pub fn remove_references(&mut self, handles: &[ReferenceHandle]) {
        self.references.remove_handles(handles);
    }

    pub fn remove_reference_paths<S: AsRef<str>>(&mut self, paths: &[S]) {
        self.references.remove_paths(paths);
    }

    pub fn import_namespaces<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        self.namespaces.import(names)
    }

    pub fn remove_namespaces<S: AsRef<str>>(&mut self, names: &[S]) {
        self.namespaces.remove(names);
    }

    /// Starts a session: runs pack init hooks in order, then folds whatever
    /// they registered into the reference and namespace sets.
    pub fn initialize(&mut self, packs: Vec<Box<dyn ScriptPack>>, args: Vec<String>) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Initialized(_) => {
                return Err(Diagnostic::lifecycle("a session is already active").into());
            }
            Lifecycle::Terminated => {
                return Err(Diagnostic::lifecycle("orchestrator has been terminated").into());
            }
        }

        let cwd = self.fs.current_directory();
        self.engine.set_base_directory(cwd.join(self.fs.bin_folder()));
        self.engine.set_cache_directory(cwd.join(self.fs.cache_folder()));

        let session = ExecutionSession::initialize(packs, args)?;
        let context = session.context();
        let mut references = self.references.clone();
        let mut namespaces = self.namespaces.clone();
        let absorbed = references
            .add_paths(context.references())
            .and_then(|()| namespaces.import(context.namespaces()));
        if let Err(err) = absorbed {
            if let Err(cleanup) = session.terminate() {
                tracing::warn!(error = %cleanup, "terminate after rejected pack contribution failed");
            }
            return Err(err);
        }
        self.references = references;
        self.namespaces = namespaces;
        let context = session.context();
        tracing::info!(
            packs = session.pack_names().count(),
            references = context.references().len(),
            namespaces = context.namespaces().len(),
            "session initialized"
        );
        self.lifecycle = Lifecycle::Initialized(session);
        Ok(())
    }

    /// Runs a script file. Relative paths resolve against the current directory;
    /// the library bundle is looked up next to the script.
    pub fn execute(&mut self, script: &Path, args: &[String]) -> Result<ExecutionResult> {
        self.ensure_active()?;
        let path = if script.is_absolute() {
            script.to_path_buf()
        } else {
            self.fs.current_directory().join(script)
        };
        let result = self.preprocessor.process_file(&path)?;
        let working_directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.fs.current_directory());
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        tracing::debug!(path = %path.display(), "executing script file");
        self.run(result, file_name, &working_directory, args)
    }

    pub fn execute_script(&mut self, text: &str, args: &[String]) -> Result<ExecutionResult> {
        self.ensure_active()?;
        let result = self.preprocessor.process_script(text)?;
        let working_directory = self.fs.current_directory();
        self.run(result, None, &working_directory, args)
    }

    fn ensure_active(&self) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Initialized(_) => Ok(()),
            Lifecycle::Uninitialized => {
                Err(Diagnostic::lifecycle("execute called before initialize").into())
            }
            Lifecycle::Terminated => Err(Diagnostic::lifecycle("execute called after terminate").into()),
        }
    }

    fn run(
        &mut self,
        mut result: PreprocessResult,
        file_name: Option<String>,
        working_directory: &Path,
        args: &[String],
    ) -> Result<ExecutionResult> {
        let Lifecycle::Initialized(session) = &mut self.lifecycle else {
            return Err(Diagnostic::lifecycle("no active session").into());
        };
        let session = session.context_mut();

        let injector = LibraryInjector {
            fs: self.fs.as_ref(),
            preprocessor: self.preprocessor.as_ref(),
            composer: self.composer.as_ref(),
        };
        injector.inject_if_needed(working_directory, &mut result, &mut session.state)?;

        self.references.merge(&result.references);
        let namespaces = self.namespaces.union(&result.namespaces);
        self.engine.set_file_name(file_name);

        let request = ExecutionRequest {
            code: &result.code,
            args,
            references: &self.references,
            namespaces: &namespaces,
        };
        self.engine.execute(request, session)
    }

    /// Restores default references and namespaces and clears session state,
    /// which re-arms library injection. Packs are not re-initialized.
    pub fn reset(&mut self) {
        self.references.reset();
        self.namespaces.reset();
        if let Lifecycle::Initialized(session) = &mut self.lifecycle {
            session.reset();
        }
        tracing::info!("session reset");
    }

    /// Runs pack terminate hooks in reverse order. Terminal: the orchestrator
    /// accepts no further executions even if a hook fails.
    pub fn terminate(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::Terminated) {
            Lifecycle::Initialized(session) => {
                tracing::info!("session terminated");
                session.terminate()
            }
            Lifecycle::Uninitialized => {
                self.lifecycle = Lifecycle::Uninitialized;
                Err(Diagnostic::lifecycle("terminate called before initialize").into())
            }
            Lifecycle::Terminated => Err(Diagnostic::lifecycle("session already terminated").into()),
        }
    }

    /// Terminates after a one-shot run. An execution error wins over a
    /// terminate error, which is then only logged.
    pub fn finish(&mut self, outcome: Result<ExecutionResult>) -> Result<ExecutionResult> {
        let terminated = self.terminate();
        match outcome {
            Ok(result) => terminated.map(|()| result),
            Err(err) => {
                if let Err(cleanup) = terminated {
                    tracing::warn!(error = %cleanup, "terminate after failed execution also failed");
                }
                Err(err)
            }
        }
    }
}
