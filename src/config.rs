//! Migration configuration
//!
//! `migrate.yaml` describes the project layout the passes are hard-wired to:
//! which tsconfig defines the working set, where the retired definitions live,
//! which modules new imports point at and which external tools to run.
//! Per-invocation values live in [`MigrationParams`].

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "migrate.yaml";

/// Parameters of one migration invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationParams {
    /// Selector being retired, e.g. `getCustomerDealer`
    pub old_name: String,
    /// Replacement getter, e.g. `getCustomerDealer` from the new store
    pub new_name: String,
    /// Module specifier new imports point at
    pub module_specifier: String,
    /// Defer every flush to one save after the last pass
    pub transaction: bool,
}

impl MigrationParams {
    pub fn new(
        old_name: impl Into<String>,
        new_name: impl Into<String>,
        module_specifier: impl Into<String>,
    ) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
            module_specifier: module_specifier.into(),
            transaction: false,
        }
    }

    pub fn with_transaction(mut self, transaction: bool) -> Self {
        self.transaction = transaction;
        self
    }

    /// Reject names that cannot appear as identifiers before touching any file.
    pub fn validate(&self) -> Result<()> {
        for (label, name) in [("old name", &self.old_name), ("new name", &self.new_name)] {
            if !crate::util::is_identifier(name) {
                return Err(Error::Config(format!("{} '{}' is not an identifier", label, name)));
            }
        }
        if self.module_specifier.trim().is_empty() {
            return Err(Error::Config("module specifier is empty".into()));
        }
        Ok(())
    }
}

/// Root configuration (`migrate.yaml`)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MigrateConfig {
    /// tsconfig.json whose files make up the working set
    #[serde(default = "default_tsconfig")]
    pub tsconfig: PathBuf,

    /// Working directory for external tools
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// Retired definitions are only deleted in files whose path contains this.
    /// Empty disables deletion.
    #[serde(default)]
    pub definition_path_prefix: String,

    /// Module that exports `withZustandStore`
    #[serde(default = "default_hoc_module")]
    pub hoc_module: String,

    /// Formatter run over touched files
    #[serde(default = "default_formatter")]
    pub formatter: ToolCommand,

    /// Type checker run after formatting
    #[serde(default = "default_typecheck")]
    pub typecheck: ToolCommand,

    /// Store action migration settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Selector library settings
    #[serde(default)]
    pub selectors: SelectorsConfig,
}

/// An external command. `files_arg` is appended with `{files}` replaced by
/// the comma-separated file list; when absent the files are passed as
/// separate arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub files_arg: Option<String>,
}

impl ToolCommand {
    /// Full argument list for a run over `files`.
    pub fn args_for(&self, files: &[PathBuf]) -> Vec<String> {
        let mut args = self.args.clone();
        if files.is_empty() {
            return args;
        }
        match &self.files_arg {
            Some(template) => {
                let joined = files
                    .iter()
                    .map(|f| f.display().to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                args.push(template.replace("{files}", &joined));
            }
            None => args.extend(files.iter().map(|f| f.display().to_string())),
        }
        args
    }

    /// Human-readable command line
    pub fn display(&self, files: &[PathBuf]) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args_for(files));
        parts.join(" ")
    }
}

/// Store action migration: `<slice>.actions.X` becomes `<facade>.actions.X`
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StoreConfig {
    /// Store name used for generated accessors, e.g. `customer`
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Redux slice being retired
    #[serde(default = "default_slice")]
    pub slice: String,

    /// Facade object exposing the new actions
    #[serde(default = "default_facade")]
    pub facade: String,

    /// Module exporting the facade
    #[serde(default = "default_store_module")]
    pub module: String,

    /// Files whose path contains this are left alone
    #[serde(default = "default_skip_path")]
    pub skip_path: String,

    /// Module exporting the store hook, relative to the selector files
    #[serde(default = "default_store_hook_module")]
    pub hook_module: String,
}

impl StoreConfig {
    /// `customer` becomes `useCustomerStore`
    pub fn store_hook(&self) -> String {
        format!("use{}Store", crate::util::capitalize(&self.name))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_store_name(),
            slice: default_slice(),
            facade: default_facade(),
            module: default_store_module(),
            skip_path: default_skip_path(),
            hook_module: default_store_hook_module(),
        }
    }
}

/// The library the selectors are moved into
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SelectorsConfig {
    /// tsconfig of the selector library
    #[serde(default)]
    pub tsconfig: Option<PathBuf>,

    /// Directory holding one selector module per file
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Library index generated accessors are exported from
    #[serde(default)]
    pub index: Option<PathBuf>,
}

fn default_tsconfig() -> PathBuf {
    PathBuf::from("tsconfig.json")
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

fn default_hoc_module() -> String {
    "../higher-order-components/withZustandStore".to_string()
}

fn default_formatter() -> ToolCommand {
    ToolCommand {
        program: "npx".to_string(),
        args: vec!["prettier".to_string(), "--write".to_string()],
        files_arg: None,
    }
}

fn default_typecheck() -> ToolCommand {
    ToolCommand {
        program: "npx".to_string(),
        args: vec!["tsc".to_string(), "--noEmit".to_string()],
        files_arg: None,
    }
}

fn default_store_name() -> String {
    "customer".to_string()
}

fn default_slice() -> String {
    "customerSlice".to_string()
}

fn default_facade() -> String {
    "Customer".to_string()
}

fn default_store_module() -> String {
    "@app/customer".to_string()
}

fn default_skip_path() -> String {
    "customerAdapter".to_string()
}

fn default_store_hook_module() -> String {
    "../customerStore".to_string()
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            tsconfig: default_tsconfig(),
            workdir: default_workdir(),
            definition_path_prefix: String::new(),
            hoc_module: default_hoc_module(),
            formatter: default_formatter(),
            typecheck: default_typecheck(),
            store: StoreConfig::default(),
            selectors: SelectorsConfig::default(),
        }
    }
}

impl MigrateConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_norway::from_str(yaml)
            .map_err(|e| Error::Config(format!("Failed to parse migrate config: {}", e)))
    }

    /// Load a config file. Relative paths inside it resolve against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Load an explicit config path, or `migrate.yaml` from `dir` when present,
    /// or defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = dir.join(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            Self::load(&default_path)
        } else {
            let mut config = Self::default();
            config.rebase(dir);
            Ok(config)
        }
    }

    fn rebase(&mut self, base: &Path) {
        if base.as_os_str().is_empty() {
            return;
        }
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        self.tsconfig = join(&self.tsconfig);
        self.workdir = join(&self.workdir);
        self.selectors.tsconfig = self.selectors.tsconfig.as_deref().map(join);
        self.selectors.dir = self.selectors.dir.as_deref().map(join);
        self.selectors.index = self.selectors.index.as_deref().map(join);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = MigrateConfig::from_yaml("{}").unwrap();
        assert_eq!(config.tsconfig, PathBuf::from("tsconfig.json"));
        assert_eq!(config.store.slice, "customerSlice");
        assert_eq!(config.store.store_hook(), "useCustomerStore");
        assert!(config.definition_path_prefix.is_empty());
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
tsconfig: apps/web/tsconfig.json
definition_path_prefix: web/js
formatter:
  program: bun
  args: [nx, "format:write"]
  files_arg: "--files={files}"
store:
  slice: accountSlice
  facade: Account
"#;
        let config = MigrateConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.definition_path_prefix, "web/js");
        assert_eq!(config.store.facade, "Account");
        assert_eq!(config.store.module, "@app/customer");
        let files = vec![PathBuf::from("a.ts"), PathBuf::from("b.ts")];
        assert_eq!(
            config.formatter.display(&files),
            "bun nx format:write --files=a.ts,b.ts"
        );
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = MigrateConfig::from_yaml("tsconfig: [unclosed").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_discover_missing_explicit_file() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        let err = MigrateConfig::discover(Some(&missing), temp.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_discover_rebases_paths() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            "tsconfig: app/tsconfig.json\n",
        )
        .unwrap();
        let config = MigrateConfig::discover(None, temp.path()).unwrap();
        assert_eq!(config.tsconfig, temp.path().join("app/tsconfig.json"));
        assert_eq!(config.workdir, temp.path().join("."));
    }

    #[test]
    fn test_params_validation() {
        assert!(MigrationParams::new("getFoo", "getFoo", "@app/foo").validate().is_ok());
        assert!(MigrationParams::new("get-foo", "getFoo", "@app/foo").validate().is_err());
        assert!(MigrationParams::new("getFoo", "getFoo", " ").validate().is_err());
    }

    #[test]
    fn test_files_as_separate_args() {
        let cmd = ToolCommand {
            program: "prettier".into(),
            args: vec!["--write".into()],
            files_arg: None,
        };
        let files = vec![PathBuf::from("a.ts")];
        assert_eq!(cmd.args_for(&files), vec!["--write", "a.ts"]);
        assert_eq!(cmd.args_for(&[]), vec!["--write"]);
    }
}
