use std::any::Any;

use indexmap::IndexMap;

use crate::diagnostics::{Diagnostic, DiagnosticKind, Result, ScriptumError};

/// Extension module taking part in a session's lifecycle.
///
/// `initialize` runs in the order packs were supplied, `terminate` in reverse.
pub trait ScriptPack {
    fn name(&self) -> &str;

    fn initialize(&mut self, session: &mut SessionContext) -> Result<()>;

    fn terminate(&mut self, _session: &mut SessionContext) -> Result<()> {
        Ok(())
    }
}

/// Mutable state shared by every execution in one session.
#[derive(Default)]
pub struct SessionState {
    /// Set once the shared library bundle has been considered for this session.
    pub injected: bool,
    extensions: IndexMap<String, Box<dyn Any>>,
}

impl SessionState {
    pub fn insert<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.extensions.insert(key.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.extensions.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.extensions.get_mut(key)?.downcast_mut()
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.extensions.shift_remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.extensions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn clear(&mut self) {
        self.injected = false;
        self.extensions.clear();
    }
}

/// The part of a session that packs and the engine see.
#[derive(Default)]
pub struct SessionContext {
    args: Vec<String>,
    references: Vec<String>,
    namespaces: Vec<String>,
    pub state: SessionState,
}

impl SessionContext {
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn add_reference(&mut self, reference: impl Into<String>) {
        self.references.push(reference.into());
    }

    pub fn import_namespace(&mut self, namespace: impl Into<String>) {
        self.namespaces.push(namespace.into());
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }
}

pub struct ExecutionSession {
    packs: Vec<Box<dyn ScriptPack>>,
    context: SessionContext,
}

impl ExecutionSession {
    /// Stores packs and arguments, then runs each pack's init hook in order.
    ///
    /// When a hook fails, packs initialized before it are terminated again in
    /// reverse order and the hook's error is returned.
    pub fn initialize(mut packs: Vec<Box<dyn ScriptPack>>, args: Vec<String>) -> Result<Self> {
        let mut context = SessionContext {
            args,
            ..SessionContext::default()
        };
        for index in 0..packs.len() {
            tracing::debug!(pack = packs[index].name(), "initializing script pack");
            if let Err(err) = packs[index].initialize(&mut context) {
                let failed = packs[index].name().to_string();
                for pack in packs[..index].iter_mut().rev() {
                    if let Err(cleanup) = pack.terminate(&mut context) {
                        tracing::warn!(pack = pack.name(), error = %cleanup, "rollback terminate failed");
                    }
                }
                return Err(pack_error(&failed, "initialize", err));
            }
        }
        Ok(Self { packs, context })
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    pub fn state(&self) -> &SessionState {
        &self.context.state
    }

    pub fn pack_names(&self) -> impl Iterator<Item = &str> {
        self.packs.iter().map(|pack| pack.name())
    }

    /// Clears shared state only. Packs keep running and are not re-initialized.
    pub fn reset(&mut self) {
        self.context.state.clear();
    }

    pub fn terminate(mut self) -> Result<()> {
        let mut first_error = None;
        for pack in self.packs.iter_mut().rev() {
            tracing::debug!(pack = pack.name(), "terminating script pack");
            if let Err(err) = pack.terminate(&mut self.context) {
                tracing::warn!(pack = pack.name(), error = %err, "script pack failed to terminate");
                if first_error.is_none() {
                    first_error = Some(pack_error(pack.name(), "terminate", err));
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn pack_error(pack: &str, hook: &str, source: ScriptumError) -> ScriptumError {
    Diagnostic::new(
        DiagnosticKind::ScriptPack,
        format!("script pack `{pack}` failed to {hook}"),
    )
    .with_note(source.to_string())
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_is_typed_and_cleared() {
        let mut state = SessionState::default();
        state.insert("counter", 3_u32);
        state.injected = true;

        assert_eq!(state.get::<u32>("counter"), Some(&3));
        assert_eq!(state.get::<String>("counter"), None);
        *state.get_mut::<u32>("counter").unwrap() += 1;
        assert_eq!(state.get::<u32>("counter"), Some(&4));

        state.clear();
        assert!(!state.injected);
        assert!(state.is_empty());
    }
}
