//! `scriptum.toml` loading.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{diagnostics::Result, orchestrator::Orchestrator};

pub const CONFIG_FILE_NAME: &str = "scriptum.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScriptumConfig {
    pub folders: FolderConfig,
    pub engine: EngineConfig,
    /// Imported into the namespace set after a session is initialized.
    pub namespaces: Vec<String>,
    /// Added to the reference set after a session is initialized.
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FolderConfig {
    pub packages: String,
    pub bin: String,
    pub cache: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            packages: "packages".into(),
            bin: "bin".into(),
            cache: ".cache".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub extension: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            extension: "csx".into(),
        }
    }
}

impl ScriptumConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Imports the configured namespaces and references. Also used after a
    /// reset, which would otherwise drop them.
    pub fn apply(&self, orchestrator: &mut Orchestrator) -> Result<()> {
        orchestrator.import_namespaces(&self.namespaces)?;
        orchestrator.add_reference_paths(&self.references)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = ScriptumConfig::parse(
            r#"
            namespaces = ["Foo.Bar"]

            [folders]
            packages = "deps"

            [engine]
            command = "dotnet-script"
            "#,
        )
        .unwrap();
        assert_eq!(config.folders.packages, "deps");
        assert_eq!(config.folders.bin, "bin");
        assert_eq!(config.engine.command.as_deref(), Some("dotnet-script"));
        assert_eq!(config.engine.extension, "csx");
        assert_eq!(config.namespaces, ["Foo.Bar"]);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = ScriptumConfig::parse("namespaces = 3").unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
