//! Shared fixtures for integration tests

#![allow(dead_code)]

use selector_migrate::{MigrateConfig, Result, Toolchain};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One recorded toolchain call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Format(Vec<PathBuf>),
    TypeCheck,
    DescribeChanges,
    Commit(Vec<PathBuf>, String),
}

/// Toolchain that records calls instead of spawning processes
#[derive(Debug)]
pub struct RecordingToolchain {
    pub calls: RefCell<Vec<ToolCall>>,
    pub typecheck_passes: bool,
}

impl Default for RecordingToolchain {
    fn default() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            typecheck_passes: true,
        }
    }
}

impl RecordingToolchain {
    pub fn failing_typecheck() -> Self {
        Self {
            typecheck_passes: false,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.borrow().clone()
    }
}

impl Toolchain for RecordingToolchain {
    fn format(&self, files: &[PathBuf]) -> Result<()> {
        self.calls.borrow_mut().push(ToolCall::Format(files.to_vec()));
        Ok(())
    }

    fn typecheck(&self) -> Result<bool> {
        self.calls.borrow_mut().push(ToolCall::TypeCheck);
        Ok(self.typecheck_passes)
    }

    fn describe_changes(&self) -> Result<String> {
        self.calls.borrow_mut().push(ToolCall::DescribeChanges);
        Ok(" M app/components/Dealer.tsx\n".to_string())
    }

    fn commit(&self, files: &[PathBuf], message: &str) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(ToolCall::Commit(files.to_vec(), message.to_string()));
        Ok(())
    }
}

/// A project on disk with a `tsconfig.json` at its root
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("tsconfig.json"),
            "{\n  // project files\n  \"compilerOptions\": { \"jsx\": \"react\" },\n}\n",
        )
        .unwrap();
        let fixture = Self { dir };
        for (name, text) in files {
            fixture.write(name, text);
        }
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, text: &str) {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, text).unwrap();
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).unwrap()
    }

    pub fn config(&self) -> MigrateConfig {
        MigrateConfig {
            tsconfig: self.path("tsconfig.json"),
            workdir: self.root().to_path_buf(),
            definition_path_prefix: "app/js".to_string(),
            ..MigrateConfig::default()
        }
    }
}
