use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result, ScriptumError},
    references::ReferenceSet,
    session::SessionContext,
};

/// Everything the engine needs for one run, borrowed from the orchestrator.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    pub code: &'a str,
    pub args: &'a [String],
    pub references: &'a ReferenceSet,
    pub namespaces: &'a [String],
}

/// Outcome reported by an engine. A failing script is a value here, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub output: Option<String>,
    pub failure: Option<String>,
    pub exit_code: Option<i32>,
}

impl ExecutionResult {
    pub fn success(output: Option<String>) -> Self {
        Self {
            output,
            failure: None,
            exit_code: Some(0),
        }
    }

    pub fn failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            output: None,
            failure: Some(message.into()),
            exit_code,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

pub trait ScriptEngine {
    fn set_base_directory(&mut self, directory: PathBuf);
    fn set_cache_directory(&mut self, directory: PathBuf);
    fn set_file_name(&mut self, file_name: Option<String>);
    fn execute(
        &mut self,
        request: ExecutionRequest<'_>,
        session: &mut SessionContext,
    ) -> Result<ExecutionResult>;
}

/// Renders the compilation unit handed to a runner: `#r` lines, `using`
/// lines, a blank separator, then the code.
pub fn render_unit(request: &ExecutionRequest<'_>) -> String {
    let mut unit = String::new();
    for path in request.references.paths() {
        let _ = writeln!(unit, "#r \"{path}\"");
    }
    for handle in request.references.handles() {
        let _ = writeln!(unit, "#r \"{}\"", handle.location.display());
    }
    for namespace in request.namespaces {
        let _ = writeln!(unit, "using {namespace};");
    }
    unit.push('\n');
    unit.push_str(request.code);
    if !unit.ends_with('\n') {
        unit.push('\n');
    }
    unit
}

/// Returns the rendered unit as output without running anything.
#[derive(Debug, Default)]
pub struct ListingEngine {
    file_name: Option<String>,
}

impl ScriptEngine for ListingEngine {
    fn set_base_directory(&mut self, _directory: PathBuf) {}

    fn set_cache_directory(&mut self, _directory: PathBuf) {}

    fn set_file_name(&mut self, file_name: Option<String>) {
        self.file_name = file_name;
    }

    fn execute(
        &mut self,
        request: ExecutionRequest<'_>,
        _session: &mut SessionContext,
    ) -> Result<ExecutionResult> {
        let mut listing = String::new();
        if let Some(name) = &self.file_name {
            let _ = writeln!(listing, "// {name}");
        }
        listing.push_str(&render_unit(&request));
        Ok(ExecutionResult::success(Some(listing)))
    }
}

/// Writes the unit into the cache directory and hands it to an external runner.
#[derive(Debug)]
pub struct ProcessEngine {
    command: String,
    args: Vec<String>,
    extension: String,
    base_directory: Option<PathBuf>,
    cache_directory: Option<PathBuf>,
    file_name: Option<String>,
}

impl ProcessEngine {
    pub fn new(command: impl Into<String>, args: Vec<String>, extension: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args,
            extension: extension.into(),
            base_directory: None,
            cache_directory: None,
            file_name: None,
        }
    }

    fn unit_path(&self) -> PathBuf {
        let stem = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).file_stem())
            .and_then(|stem| stem.to_str())
            .unwrap_or("script");
        let directory = self
            .cache_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        directory.join(format!("{stem}.{}", self.extension))
    }
}

impl ScriptEngine for ProcessEngine {
    fn set_base_directory(&mut self, directory: PathBuf) {
        self.base_directory = Some(directory);
    }

    fn set_cache_directory(&mut self, directory: PathBuf) {
        self.cache_directory = Some(directory);
    }

    fn set_file_name(&mut self, file_name: Option<String>) {
        self.file_name = file_name;
    }

    fn execute(
        &mut self,
        request: ExecutionRequest<'_>,
        _session: &mut SessionContext,
    ) -> Result<ExecutionResult> {
        let unit = self.unit_path();
        if let Some(parent) = unit.parent() {
            fs::create_dir_all(parent).map_err(|err| execution_error("create cache directory", err))?;
        }
        fs::write(&unit, render_unit(&request))
            .map_err(|err| execution_error("write compilation unit", err))?;

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .arg(&unit)
            .arg("--")
            .args(request.args);
        if let Some(base) = self.base_directory.as_ref().filter(|dir| dir.is_dir()) {
            command.env("SCRIPTUM_BASE_DIR", base);
        }
        tracing::debug!(command = %self.command, unit = %unit.display(), "spawning script runner");
        let output = command.output().map_err(|err| {
            ScriptumError::from(
                Diagnostic::new(
                    DiagnosticKind::Execution,
                    format!("failed to start `{}`", self.command),
                )
                .with_note(err.to_string()),
            )
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(ExecutionResult::success(Some(stdout)));
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let mut result = ExecutionResult::failed(
            if stderr.is_empty() {
                format!("`{}` exited with {}", self.command, output.status)
            } else {
                stderr
            },
            output.status.code(),
        );
        result.output = Some(stdout);
        Ok(result)
    }
}

fn execution_error(action: &str, err: std::io::Error) -> ScriptumError {
    Diagnostic::new(DiagnosticKind::Execution, format!("failed to {action}"))
        .with_note(err.to_string())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_lists_references_then_usings_then_code() {
        let mut references = ReferenceSet::new();
        references.remove_paths(&crate::references::DEFAULT_REFERENCES);
        references.merge(&["Dapper.dll"]);
        let namespaces = vec!["System".to_string(), "Foo.Bar".to_string()];
        let request = ExecutionRequest {
            code: "Console.WriteLine(1);",
            args: &[],
            references: &references,
            namespaces: &namespaces,
        };
        assert_eq!(
            render_unit(&request),
            "#r \"Dapper.dll\"\nusing System;\nusing Foo.Bar;\n\nConsole.WriteLine(1);\n"
        );
    }
}
