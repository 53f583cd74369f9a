use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{config::FolderConfig, diagnostics::Result};

/// File-system access the orchestrator and pre-processor rely on.
pub trait FileSystem {
    fn current_directory(&self) -> PathBuf;
    fn bin_folder(&self) -> &str;
    fn cache_folder(&self) -> &str;
    fn packages_folder(&self) -> &str;
    fn exists(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
    folders: FolderConfig,
}

impl LocalFileSystem {
    pub fn new(root: impl Into<PathBuf>, folders: FolderConfig) -> Self {
        Self {
            root: root.into(),
            folders,
        }
    }

    /// Rooted at the process working directory.
    pub fn from_env(folders: FolderConfig) -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?, folders))
    }
}

impl FileSystem for LocalFileSystem {
    fn current_directory(&self) -> PathBuf {
        self.root.clone()
    }

    fn bin_folder(&self) -> &str {
        &self.folders.bin
    }

    fn cache_folder(&self) -> &str {
        &self.folders.cache
    }

    fn packages_folder(&self) -> &str {
        &self.folders.packages
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(path)?)
    }
}
