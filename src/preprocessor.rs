use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
    rc::Rc,
};

use indexmap::IndexSet;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind, Result, ScriptumError},
    filesystem::FileSystem,
};

/// Ready-to-run code plus the dependencies the source declared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessResult {
    pub code: String,
    pub references: Vec<String>,
    pub namespaces: Vec<String>,
}

pub trait Preprocessor {
    fn process_file(&self, path: &Path) -> Result<PreprocessResult>;
    fn process_script(&self, text: &str) -> Result<PreprocessResult>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    Reference(String),
    Load(String),
    Using(String),
}

impl Directive {
    fn parse(line: &str, line_no: usize) -> Result<Option<Self>> {
        if let Some(rest) = line.strip_prefix("#r") {
            if rest.starts_with(char::is_whitespace) {
                return quoted(rest, line_no).map(|arg| Some(Directive::Reference(arg)));
            }
        }
        if let Some(rest) = line.strip_prefix("#load") {
            if rest.starts_with(char::is_whitespace) {
                return quoted(rest, line_no).map(|arg| Some(Directive::Load(arg)));
            }
        }
        if let Some(rest) = line.strip_prefix("using ") {
            if let Some(name) = rest.trim().strip_suffix(';') {
                let name = name.trim();
                if is_dotted_identifier(name) {
                    return Ok(Some(Directive::Using(name.to_string())));
                }
            }
        }
        Ok(None)
    }
}

fn quoted(rest: &str, line_no: usize) -> Result<String> {
    let rest = rest.trim();
    let inner = rest
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .filter(|s| !s.is_empty() && !s.contains('"'));
    match inner {
        Some(arg) => Ok(arg.to_string()),
        None => Err(preprocess_error(format!(
            "line {line_no}: expected a quoted argument, found `{rest}`"
        ))),
    }
}

fn is_dotted_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
                && chars.all(|c| c.is_alphanumeric() || c == '_')
        })
}

fn preprocess_error(message: impl Into<String>) -> ScriptumError {
    Diagnostic::new(DiagnosticKind::Preprocess, message).into()
}

/// Line-oriented pre-processor for `#r`, `#load` and prologue `using` directives.
///
/// `using` lines only count as namespace imports before the first code line;
/// afterwards they are left in the code untouched.
pub struct DirectivePreprocessor {
    fs: Rc<dyn FileSystem>,
}

#[derive(Default)]
struct Expansion {
    lines: Vec<String>,
    references: IndexSet<String>,
    namespaces: IndexSet<String>,
    loaded: HashSet<PathBuf>,
    stack: Vec<PathBuf>,
}

impl Expansion {
    fn finish(self) -> PreprocessResult {
        PreprocessResult {
            code: self.lines.join("\n"),
            references: self.references.into_iter().collect(),
            namespaces: self.namespaces.into_iter().collect(),
        }
    }
}

impl DirectivePreprocessor {
    pub fn new(fs: Rc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    fn expand_file(&self, path: &Path, out: &mut Expansion) -> Result<()> {
        let path = normalize(path);
        if out.stack.contains(&path) {
            return Err(Diagnostic::new(
                DiagnosticKind::Preprocess,
                format!("`#load` cycle through `{}`", path.display()),
            )
            .with_note(format!("load chain has {} file(s)", out.stack.len()))
            .into());
        }
        if !out.loaded.insert(path.clone()) {
            tracing::debug!(path = %path.display(), "file already loaded, skipping");
            return Ok(());
        }
        let source = self.fs.read_to_string(&path).map_err(|err| {
            ScriptumError::from(
                Diagnostic::new(
                    DiagnosticKind::Preprocess,
                    format!("cannot read `{}`", path.display()),
                )
                .with_note(err.to_string()),
            )
        })?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        out.stack.push(path);
        self.expand_source(&source, &base, out)?;
        out.stack.pop();
        Ok(())
    }

    fn expand_source(&self, source: &str, base: &Path, out: &mut Expansion) -> Result<()> {
        let mut in_prologue = true;
        for (index, line) in source.lines().enumerate() {
            let trimmed = line.trim();
            let directive = if trimmed.starts_with('#') || in_prologue {
                Directive::parse(trimmed, index + 1)?
            } else {
                None
            };
            match directive {
                Some(Directive::Reference(reference)) => {
                    out.references.insert(reference);
                }
                Some(Directive::Load(target)) => {
                    self.expand_file(&base.join(target), out)?;
                }
                Some(Directive::Using(namespace)) => {
                    out.namespaces.insert(namespace);
                }
                None => {
                    if !trimmed.is_empty() && !trimmed.starts_with("//") {
                        in_prologue = false;
                    }
                    out.lines.push(line.to_string());
                }
            }
        }
        Ok(())
    }
}

impl Preprocessor for DirectivePreprocessor {
    fn process_file(&self, path: &Path) -> Result<PreprocessResult> {
        let mut out = Expansion::default();
        self.expand_file(path, &mut out)?;
        Ok(out.finish())
    }

    fn process_script(&self, text: &str) -> Result<PreprocessResult> {
        let mut out = Expansion::default();
        let base = self.fs.current_directory();
        self.expand_source(text, &base, &mut out)?;
        Ok(out.finish())
    }
}

/// Lexically resolves `.` and `..` so the same file reached by two routes
/// shares one identity.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directives() {
        assert_eq!(
            Directive::parse(r#"#r "System.Web""#, 1).unwrap(),
            Some(Directive::Reference("System.Web".into()))
        );
        assert_eq!(
            Directive::parse("using Foo.Bar;", 1).unwrap(),
            Some(Directive::Using("Foo.Bar".into()))
        );
        assert_eq!(Directive::parse("using (var x = y) {", 1).unwrap(), None);
        assert_eq!(Directive::parse("#region", 1).unwrap(), None);
    }

    #[test]
    fn unquoted_argument_reports_line() {
        let err = Directive::parse("#load other.csx", 4).unwrap_err();
        assert!(err.to_string().contains("line 4"));
    }

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(
            normalize(Path::new("/work/lib/../src/./a.csx")),
            PathBuf::from("/work/src/a.csx")
        );
    }
}
