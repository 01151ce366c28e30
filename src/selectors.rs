//! Selector library helpers
//!
//! Discovers the getters exported by the selector library and generates
//! store accessors next to a selector.

use crate::config::MigrateConfig;
use crate::error::{Error, Result};
use crate::imports::ensure_named_import;
use crate::syntax::{named_children, Edit, SourceFile};
use crate::tsconfig::discover_source_files;
use crate::util::capitalize;
use std::path::{Component, Path, PathBuf};
use tree_sitter::Node;
use walkdir::WalkDir;

/// An exported getter of the selector library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Getter {
    pub file: PathBuf,
    pub name: String,
}

/// Names a module exports through `export function`, `export const` and
/// `export { a, b as c }`, in source order.
pub fn exported_names(file: &SourceFile) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in file.statements() {
        if stmt.kind() != "export_statement" {
            continue;
        }
        if let Some(decl) = stmt.child_by_field_name("declaration") {
            names.extend(declared_names(file, decl));
            continue;
        }
        for part in named_children(stmt) {
            if part.kind() != "export_clause" {
                continue;
            }
            for spec in named_children(part) {
                let exported = spec
                    .child_by_field_name("alias")
                    .or_else(|| spec.child_by_field_name("name"));
                if let Some(node) = exported {
                    names.push(file.node_text(node).to_string());
                }
            }
        }
    }
    names
}

fn declared_names(file: &SourceFile, decl: Node<'_>) -> Vec<String> {
    match decl.kind() {
        "function_declaration" | "generator_function_declaration" => decl
            .child_by_field_name("name")
            .map(|n| vec![file.node_text(n).to_string()])
            .unwrap_or_default(),
        "lexical_declaration" | "variable_declaration" => named_children(decl)
            .into_iter()
            .filter(|d| d.kind() == "variable_declarator")
            .filter_map(|d| d.child_by_field_name("name"))
            .filter(|n| n.kind() == "identifier")
            .map(|n| file.node_text(n).to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Every exported name starting with `get` in the `.ts` files directly
/// inside `dir`. Files are visited in name order.
pub fn exported_getters(dir: &Path) -> Result<Vec<Getter>> {
    if !dir.is_dir() {
        return Err(Error::Config(format!(
            "selectors directory not found: {}",
            dir.display()
        )));
    }

    let mut getters = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::Io(e.into()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("ts") {
            continue;
        }
        let file = SourceFile::load(path)?;
        getters.extend(
            exported_names(&file)
                .into_iter()
                .filter(|name| name.starts_with("get"))
                .map(|name| Getter {
                    file: path.to_path_buf(),
                    name,
                }),
        );
    }
    tracing::info!("Found {} exported getters in {}", getters.len(), dir.display());
    Ok(getters)
}

/// Whether `name` is declared at the top level as a function or variable,
/// exported or not.
pub fn declares(file: &SourceFile, name: &str) -> bool {
    file.statements().into_iter().any(|stmt| {
        let decl = if stmt.kind() == "export_statement" {
            match stmt.child_by_field_name("declaration") {
                Some(decl) => decl,
                None => return false,
            }
        } else {
            stmt
        };
        declared_names(file, decl).iter().any(|n| n == name)
    })
}

/// What [`generate_accessors`] added
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessors {
    pub file: PathBuf,
    pub hook: String,
    pub getter: String,
    pub index: PathBuf,
}

/// `selectors/customerDealer.ts` with store `customer` gives `Dealer`.
pub fn accessor_base(path: &Path, store_name: &str) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match stem.strip_prefix(store_name) {
        Some(rest) if !rest.is_empty() => capitalize(rest),
        _ => capitalize(stem),
    }
}

fn hook_snippet(hook: &str, store_hook: &str, selector: &str) -> String {
    format!(
        "export const {} = () => {{\n  return {}({})\n}}",
        hook, store_hook, selector
    )
}

fn getter_snippet(getter: &str, store_hook: &str, selector: &str) -> String {
    format!(
        "export const {} = () => {{\n  return {}({}.getState())\n}}",
        getter, selector, store_hook
    )
}

/// Module specifier of `target` as seen from `from_dir`, without extension.
fn relative_specifier(from_dir: &Path, target: &Path) -> Result<String> {
    let rel = target.strip_prefix(from_dir).map_err(|_| {
        Error::Config(format!(
            "{} is outside of {}",
            target.display(),
            from_dir.display()
        ))
    })?;
    let parts: Vec<String> = rel
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Ok(format!("./{}", parts.join("/")))
}

fn selector_files(config: &MigrateConfig) -> Result<Vec<PathBuf>> {
    if let Some(tsconfig) = &config.selectors.tsconfig {
        return discover_source_files(tsconfig);
    }
    let dir = config
        .selectors
        .dir
        .as_ref()
        .ok_or_else(|| Error::Config("neither selectors.tsconfig nor selectors.dir is set".into()))?;
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("ts"))
        .collect();
    files.sort();
    Ok(files)
}

/// Generate `use<Store><Base>` and `get<Store><Base>` next to `selector`,
/// import the store hook there and export both from the library index.
///
/// The index and the declaring file are resolved before anything is written.
pub fn generate_accessors(config: &MigrateConfig, selector: &str) -> Result<Accessors> {
    let index_path = config
        .selectors
        .index
        .clone()
        .ok_or_else(|| Error::Config("selectors.index is not set".into()))?;
    if !index_path.is_file() {
        return Err(Error::Config(format!(
            "index file not found: {}",
            index_path.display()
        )));
    }

    let mut declaring = None;
    for path in selector_files(config)? {
        if path == index_path {
            continue;
        }
        let file = SourceFile::load(&path)?;
        if declares(&file, selector) {
            declaring = Some(file);
            break;
        }
    }
    let mut file = declaring
        .ok_or_else(|| Error::Config(format!("no declaration of '{}' found", selector)))?;

    let store = &config.store;
    let store_name = capitalize(&store.name);
    let base = accessor_base(file.path(), &store.name);
    let hook = format!("use{}{}", store_name, base);
    let getter = format!("get{}{}", store_name, base);
    let store_hook = store.store_hook();

    let index_dir = index_path.parent().unwrap_or_else(|| Path::new("."));
    let specifier = relative_specifier(index_dir, file.path())?;
    let mut index = SourceFile::load(&index_path)?;

    if declares(&file, &hook) {
        tracing::info!("{} already declared in {}", hook, file.path().display());
    } else {
        let separator = if file.text().ends_with('\n') { "\n" } else { "\n\n" };
        let added = format!(
            "{}{}\n\n{}\n",
            separator,
            hook_snippet(&hook, &store_hook, selector),
            getter_snippet(&getter, &store_hook, selector)
        );
        tracing::info!("{}", file.path().display());
        tracing::info!("+ {}", added.trim());
        let end = file.text().len();
        file.apply(vec![Edit::insert(end, added)])?;
        ensure_named_import(&mut file, &store_hook, &store.hook_module)?;
    }

    if exported_names(&index).contains(&hook) {
        tracing::debug!("{} already exported from {}", hook, index_path.display());
    } else {
        let statement = format!("export {{ {}, {} }} from \"{}\";\n", hook, getter, specifier);
        let end = index.text().len();
        let text = if index.text().is_empty() || index.text().ends_with('\n') {
            statement
        } else {
            format!("\n{}", statement)
        };
        tracing::info!("+ {}", text.trim());
        index.apply(vec![Edit::insert(end, text)])?;
    }

    file.save()?;
    index.save()?;

    Ok(Accessors {
        file: file.path().to_path_buf(),
        hook,
        getter,
        index: index_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorsConfig;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn library() -> (TempDir, MigrateConfig) {
        let dir = TempDir::new().unwrap();
        let selectors = dir.path().join("src/selectors");
        std::fs::create_dir_all(&selectors).unwrap();
        std::fs::write(
            selectors.join("customerDealer.ts"),
            "import { CustomerState } from '../types';\n\nexport const selectDealer = (state: CustomerState) => state.dealer;\n",
        )
        .unwrap();
        std::fs::write(
            selectors.join("customerName.ts"),
            "export function getCustomerName() {\n  return 'x';\n}\nconst getHidden = 1;\nexport { getHidden as getAlias };\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("src/index.ts"), "export * from './types';\n").unwrap();

        let config = MigrateConfig {
            selectors: SelectorsConfig {
                tsconfig: None,
                dir: Some(selectors),
                index: Some(dir.path().join("src/index.ts")),
            },
            ..MigrateConfig::default()
        };
        (dir, config)
    }

    #[test]
    fn test_exported_getters() {
        let (_dir, config) = library();
        let getters = exported_getters(config.selectors.dir.as_ref().unwrap()).unwrap();
        let names: Vec<_> = getters.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["getCustomerName", "getAlias"]);
    }

    #[test]
    fn test_exported_getters_missing_dir() {
        let dir = TempDir::new().unwrap();
        let err = exported_getters(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_accessor_base() {
        assert_eq!(accessor_base(Path::new("a/customerDealer.ts"), "customer"), "Dealer");
        assert_eq!(accessor_base(Path::new("a/dealer.ts"), "customer"), "Dealer");
        assert_eq!(accessor_base(Path::new("a/customer.ts"), "customer"), "Customer");
    }

    #[test]
    fn test_generate_accessors() {
        let (dir, config) = library();
        let added = generate_accessors(&config, "selectDealer").unwrap();
        assert_eq!(added.hook, "useCustomerDealer");
        assert_eq!(added.getter, "getCustomerDealer");

        let selector = std::fs::read_to_string(dir.path().join("src/selectors/customerDealer.ts")).unwrap();
        assert_eq!(
            selector,
            "import { CustomerState } from '../types';\nimport { useCustomerStore } from '../customerStore';\n\nexport const selectDealer = (state: CustomerState) => state.dealer;\n\nexport const useCustomerDealer = () => {\n  return useCustomerStore(selectDealer)\n}\n\nexport const getCustomerDealer = () => {\n  return selectDealer(useCustomerStore.getState())\n}\n"
        );

        let index = std::fs::read_to_string(dir.path().join("src/index.ts")).unwrap();
        assert_eq!(
            index,
            "export * from './types';\nexport { useCustomerDealer, getCustomerDealer } from \"./selectors/customerDealer\";\n"
        );

        // Second run adds nothing.
        generate_accessors(&config, "selectDealer").unwrap();
        let again = std::fs::read_to_string(dir.path().join("src/index.ts")).unwrap();
        assert_eq!(again, index);
    }

    #[test]
    fn test_generate_accessors_missing_index_writes_nothing() {
        let (dir, mut config) = library();
        config.selectors.index = Some(dir.path().join("src/missing.ts"));
        let before = std::fs::read_to_string(dir.path().join("src/selectors/customerDealer.ts")).unwrap();

        let err = generate_accessors(&config, "selectDealer").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let after = std::fs::read_to_string(dir.path().join("src/selectors/customerDealer.ts")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_generate_accessors_unknown_selector() {
        let (_dir, config) = library();
        let err = generate_accessors(&config, "selectNothing").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
