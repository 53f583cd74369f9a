//! Script-execution orchestrator: tracks the references and namespaces handed
//! to an external engine, runs script packs through a session lifecycle, and
//! splices the shared script library into the first script of each session.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod filesystem;
pub mod library;
pub mod namespaces;
pub mod orchestrator;
pub mod preprocessor;
pub mod references;
pub mod repl;
pub mod session;

pub use config::ScriptumConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, ScriptumError};
pub use engine::{ExecutionRequest, ExecutionResult, ScriptEngine};
pub use orchestrator::{Orchestrator, Phase};
pub use preprocessor::{PreprocessResult, Preprocessor};
pub use repl::Repl;
pub use session::{ScriptPack, SessionContext};
