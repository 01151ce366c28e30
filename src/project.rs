//! In-memory project
//!
//! The parsed working set of one invocation. Passes receive it as `&mut
//! Project`; nothing is read back from disk until the next load.

use crate::error::Result;
use crate::syntax::SourceFile;
use crate::tsconfig;
use std::path::{Path, PathBuf};

/// Parsed source files of one invocation
#[derive(Debug, Default)]
pub struct Project {
    files: Vec<SourceFile>,
}

impl Project {
    /// Load every file covered by a tsconfig.
    ///
    /// Fails with a configuration error when the tsconfig is missing or
    /// invalid; no file is touched in that case.
    pub fn load(tsconfig_path: &Path) -> Result<Self> {
        tracing::info!(tsconfig = %tsconfig_path.display(), "Loading project files...");
        let paths = tsconfig::discover_source_files(tsconfig_path)?;
        let project = Self::from_paths(&paths)?;
        tracing::info!("Project files loaded. Found {} files.", project.len());
        Ok(project)
    }

    /// Load an explicit list of files.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        let files = paths
            .iter()
            .map(|p| SourceFile::load(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { files })
    }

    /// Build a project from in-memory sources (used by tests and dry runs).
    pub fn from_sources<P, S>(sources: impl IntoIterator<Item = (P, S)>) -> Result<Self>
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let files = sources
            .into_iter()
            .map(|(path, text)| SourceFile::parse(path, text))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [SourceFile] {
        &mut self.files
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path() == path)
    }

    pub fn file_mut(&mut self, path: &Path) -> Option<&mut SourceFile> {
        self.files.iter_mut().find(|f| f.path() == path)
    }

    /// Paths of files with unsaved changes
    pub fn dirty_paths(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.is_dirty())
            .map(|f| f.path().to_path_buf())
            .collect()
    }

    /// Persist every changed file in one batch. Returns how many were written.
    pub fn save(&mut self) -> Result<usize> {
        tracing::info!("Saving project...");
        let mut written = 0;
        for file in &mut self.files {
            if file.save()? {
                written += 1;
            }
        }
        tracing::info!(written, "Project saved");
        Ok(written)
    }
}
