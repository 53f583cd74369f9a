use rustyline::{DefaultEditor, error::ReadlineError};

use crate::{
    config::ScriptumConfig,
    diagnostics::{Result, ScriptumError},
    engine::ExecutionResult,
    orchestrator::Orchestrator,
};

/// Interactive loop over one initialized orchestrator session.
pub struct Repl {
    orchestrator: Orchestrator,
    config: ScriptumConfig,
}

impl Repl {
    pub fn new(orchestrator: Orchestrator, config: ScriptumConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    pub fn run(mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().map_err(readline_error)?;
        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(trimmed).ok();
                    match trimmed {
                        ":quit" | ":exit" => break,
                        ":reset" => {
                            self.orchestrator.reset();
                            if let Err(err) = self.config.apply(&mut self.orchestrator) {
                                eprintln!("error: {err}");
                            }
                        }
                        ":refs" => {
                            let references = self.orchestrator.references();
                            for path in references.paths() {
                                println!("{path}");
                            }
                            for handle in references.handles() {
                                println!("{} ({})", handle.name, handle.location.display());
                            }
                        }
                        ":usings" => {
                            for namespace in self.orchestrator.namespaces().as_slice() {
                                println!("{namespace}");
                            }
                        }
                        source => match self.orchestrator.execute_script(source, &[]) {
                            Ok(result) => print_result(&result),
                            Err(ScriptumError::Diagnostic(diag)) => {
                                eprintln!("{:?}: {}", diag.kind, diag.message);
                            }
                            Err(other) => eprintln!("error: {other}"),
                        },
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => {
                    self.orchestrator.terminate()?;
                    return Err(readline_error(err));
                }
            }
        }
        self.orchestrator.terminate()
    }
}

pub fn print_result(result: &ExecutionResult) {
    if let Some(output) = result.output.as_deref().filter(|out| !out.is_empty()) {
        print!("{output}");
        if !output.ends_with('\n') {
            println!();
        }
    }
    if let Some(failure) = &result.failure {
        eprintln!("script failed: {failure}");
    }
}

fn readline_error(err: ReadlineError) -> ScriptumError {
    ScriptumError::from(std::io::Error::other(err))
}
