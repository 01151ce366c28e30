//! tsconfig.json loading and source file discovery
//!
//! Only the fields that decide the working set are read: `files`, `include`,
//! `exclude` and `extends`. The file is JSONC, so comments and trailing commas
//! are stripped before handing it to serde_json.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions loaded into a project
pub const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx"];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsConfig {
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
}

pub fn parse_tsconfig(source: &str) -> Result<TsConfig> {
    let stripped = strip_jsonc(source);
    let normalized = remove_trailing_commas(&stripped);
    serde_json::from_str(&normalized)
        .map_err(|e| Error::Config(format!("failed to parse tsconfig JSON: {}", e)))
}

/// Load a tsconfig, following `extends` chains. Child values win.
pub fn load_tsconfig(path: &Path) -> Result<TsConfig> {
    let mut visited = HashSet::new();
    load_tsconfig_inner(path, &mut visited)
}

fn load_tsconfig_inner(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<TsConfig> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical.clone()) {
        return Err(Error::Config(format!(
            "tsconfig extends cycle detected at {}",
            canonical.display()
        )));
    }

    let source = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("failed to read tsconfig {}: {}", path.display(), e))
    })?;
    let mut config = parse_tsconfig(&source)?;

    if let Some(extends) = config.extends.take() {
        // Package-style bases (`@tsconfig/node18`) carry no file lists we can use.
        if extends.starts_with('.') || Path::new(&extends).is_absolute() {
            let base_path = resolve_extends_path(path, &extends)?;
            let base = load_tsconfig_inner(&base_path, visited)?;
            config = TsConfig {
                extends: None,
                files: config.files.or(base.files),
                include: config.include.or(base.include),
                exclude: config.exclude.or(base.exclude),
            };
        }
    }

    visited.remove(&canonical);
    Ok(config)
}

fn resolve_extends_path(current_path: &Path, extends: &str) -> Result<PathBuf> {
    let base_dir = current_path
        .parent()
        .ok_or_else(|| Error::Config("tsconfig has no parent directory".into()))?;
    let mut candidate = PathBuf::from(extends);
    if candidate.extension().is_none() {
        candidate.set_extension("json");
    }

    if candidate.is_absolute() {
        Ok(candidate)
    } else {
        Ok(base_dir.join(candidate))
    }
}

/// Resolve the source files a tsconfig covers, sorted by path.
pub fn discover_source_files(tsconfig_path: &Path) -> Result<Vec<PathBuf>> {
    if !tsconfig_path.is_file() {
        return Err(Error::Config(format!(
            "tsconfig not found: {}",
            tsconfig_path.display()
        )));
    }
    let config = load_tsconfig(tsconfig_path)?;
    let root = tsconfig_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut found: Vec<PathBuf> = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for file in config.files.iter().flatten() {
        let path = root.join(file);
        if path.is_file() && seen.insert(path.clone()) {
            found.push(path);
        }
    }

    // `files` without `include` means exactly those files.
    let include_patterns = match (&config.include, &config.files) {
        (Some(include), _) => include.clone(),
        (None, Some(_)) => Vec::new(),
        (None, None) => vec!["**/*".to_string()],
    };
    if include_patterns.is_empty() {
        found.sort();
        return Ok(found);
    }

    let include = build_globset(&include_patterns)?;
    let exclude = build_globset(config.exclude.as_deref().unwrap_or(&[]))?;

    let mut walked = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != "node_modules")
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !has_source_extension(path) {
            continue;
        }
        let relative = match path.strip_prefix(&root) {
            Ok(r) => r,
            Err(_) => continue,
        };
        if include.is_match(relative) && !exclude.is_match(relative) {
            walked.push(path.to_path_buf());
        }
    }
    walked.sort();
    for path in walked {
        if seen.insert(path.clone()) {
            found.push(path);
        }
    }

    Ok(found)
}

pub fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SOURCE_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

/// tsconfig patterns naming a directory (`src`) cover everything beneath it.
fn normalize_pattern(pattern: &str) -> String {
    let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let has_wildcard = trimmed.contains('*') || trimmed.contains('?');
    if !has_wildcard && !last.contains('.') {
        format!("{}/**/*", trimmed)
    } else {
        trimmed.to_string()
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let normalized = normalize_pattern(pattern);
        let glob = Glob::new(&normalized)
            .map_err(|e| Error::Config(format!("invalid tsconfig pattern '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Config(format!("invalid tsconfig patterns: {}", e)))
}

fn strip_jsonc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    while let Some(ch) = chars.next() {
        if in_line_comment {
            if ch == '\n' {
                in_line_comment = false;
                out.push(ch);
            }
            continue;
        }

        if in_block_comment {
            if ch == '*' {
                if let Some('/') = chars.peek().copied() {
                    chars.next();
                    in_block_comment = false;
                }
            } else if ch == '\n' {
                out.push(ch);
            }
            continue;
        }

        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            continue;
        }

        if ch == '/' {
            match chars.peek().copied() {
                Some('/') => {
                    chars.next();
                    in_line_comment = true;
                    continue;
                }
                Some('*') => {
                    chars.next();
                    in_block_comment = true;
                    continue;
                }
                _ => {}
            }
        }

        out.push(ch);
    }

    out
}

fn remove_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            if escape {
                escape = false;
            } else if ch == '\\' {
                escape = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            continue;
        }

        if ch == ',' {
            let mut lookahead = chars.clone();
            let mut trailing = false;
            while let Some(next) = lookahead.peek().copied() {
                if next.is_whitespace() {
                    lookahead.next();
                    continue;
                }
                trailing = next == '}' || next == ']';
                break;
            }
            if trailing {
                continue;
            }
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parses_jsonc_with_trailing_commas() {
        let source = r#"{
            // comment
            "include": ["src", /* inline */ "types/**/*.ts",],
            "exclude": ["**/*.spec.ts"],
        }"#;
        let config = parse_tsconfig(source).unwrap();
        assert_eq!(
            config.include,
            Some(vec!["src".to_string(), "types/**/*.ts".to_string()])
        );
        assert_eq!(config.exclude, Some(vec!["**/*.spec.ts".to_string()]));
    }

    #[test]
    fn test_strings_keep_slashes() {
        let config = parse_tsconfig(r#"{ "files": ["a//b.ts"] }"#).unwrap();
        assert_eq!(config.files, Some(vec!["a//b.ts".to_string()]));
    }

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(normalize_pattern("src"), "src/**/*");
        assert_eq!(normalize_pattern("./src/"), "src/**/*");
        assert_eq!(normalize_pattern("src/**/*.ts"), "src/**/*.ts");
        assert_eq!(normalize_pattern("index.ts"), "index.ts");
    }

    #[test]
    fn test_discover_source_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("src/a.ts"), "").unwrap();
        fs::write(root.join("src/nested/b.tsx"), "").unwrap();
        fs::write(root.join("src/a.spec.ts"), "").unwrap();
        fs::write(root.join("src/styles.css"), "").unwrap();
        fs::write(root.join("node_modules/pkg/index.ts"), "").unwrap();
        fs::write(
            root.join("tsconfig.json"),
            r#"{ "include": ["src"], "exclude": ["**/*.spec.ts"] }"#,
        )
        .unwrap();

        let files = discover_source_files(&root.join("tsconfig.json")).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["src/a.ts", "src/nested/b.tsx"]);
    }

    #[test]
    fn test_extends_merges_base_include() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("base.json"), r#"{ "include": ["lib"] }"#).unwrap();
        fs::write(root.join("tsconfig.json"), r#"{ "extends": "./base" }"#).unwrap();
        let config = load_tsconfig(&root.join("tsconfig.json")).unwrap();
        assert_eq!(config.include, Some(vec!["lib".to_string()]));
    }

    #[test]
    fn test_missing_tsconfig_is_config_error() {
        let temp = TempDir::new().unwrap();
        let err = discover_source_files(&temp.path().join("tsconfig.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
