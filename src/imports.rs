//! Import declaration normalization
//!
//! Moves a named import to its target module: specifiers of the old name
//! imported from anywhere else are removed, declarations emptied by that
//! removal are dropped, and `import { name } from "module"` is ensured.

use crate::error::Result;
use crate::syntax::{line_range, named_children, unquote, Edit, SourceFile};
use std::ops::Range;
use tree_sitter::Node;

/// One `import { name as alias }` specifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImport {
    pub name: String,
    pub text: String,
    pub range: Range<usize>,
}

/// A parsed `import ... from "module"` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    pub range: Range<usize>,
    pub module: String,
    pub quote: char,
    pub type_only: bool,
    pub default: Option<Range<usize>>,
    pub namespace: Option<Range<usize>>,
    pub named: Vec<NamedImport>,
    pub named_range: Option<Range<usize>>,
    pub clause_range: Option<Range<usize>>,
}

impl ImportDecl {
    fn imports(&self, name: &str) -> bool {
        self.named.iter().any(|n| n.name == name)
    }
}

fn parse_import(file: &SourceFile, stmt: Node<'_>) -> Option<ImportDecl> {
    let source = stmt.child_by_field_name("source")?;
    let source_text = file.node_text(source);
    let quote = if source_text.starts_with('\'') { '\'' } else { '"' };

    let mut cursor = stmt.walk();
    let children: Vec<Node<'_>> = stmt.children(&mut cursor).collect();
    let type_only = children.iter().any(|c| c.kind() == "type");
    let clause = children.iter().copied().find(|c| c.kind() == "import_clause");

    let mut decl = ImportDecl {
        range: stmt.byte_range(),
        module: unquote(source_text).to_string(),
        quote,
        type_only,
        default: None,
        namespace: None,
        named: Vec::new(),
        named_range: None,
        clause_range: clause.map(|c| c.byte_range()),
    };

    if let Some(clause) = clause {
        for part in named_children(clause) {
            match part.kind() {
                "identifier" => decl.default = Some(part.byte_range()),
                "namespace_import" => decl.namespace = Some(part.byte_range()),
                "named_imports" => {
                    decl.named_range = Some(part.byte_range());
                    for spec in named_children(part) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        decl.named.push(NamedImport {
                            name: file.node_text(name).to_string(),
                            text: file.node_text(spec).to_string(),
                            range: spec.byte_range(),
                        });
                    }
                }
                _ => {}
            }
        }
    }
    Some(decl)
}

/// All top-level import declarations with a module source, in order.
pub fn import_declarations(file: &SourceFile) -> Vec<ImportDecl> {
    file.statements()
        .into_iter()
        .filter(|s| s.kind() == "import_statement")
        .filter_map(|s| parse_import(file, s))
        .collect()
}

/// Whether `name` is imported from some module other than `module`.
pub fn imported_elsewhere(file: &SourceFile, name: &str, module: &str) -> bool {
    import_declarations(file)
        .iter()
        .any(|d| d.module != module && d.imports(name))
}

/// Remove `name` specifiers imported from any module other than `keep_module`.
/// Declarations left with nothing to import are removed entirely; side-effect
/// imports that never named `name` are not touched. Returns the number of
/// specifiers removed.
pub fn remove_named_import(file: &mut SourceFile, name: &str, keep_module: Option<&str>) -> Result<usize> {
    let mut edits = Vec::new();
    let mut removed = 0;
    let text = file.text().to_string();

    for decl in import_declarations(file) {
        if !decl.imports(name) {
            continue;
        }
        if Some(decl.module.as_str()) == keep_module {
            tracing::debug!(path = %file.path().display(), module = %decl.module, "Correct import already present");
            continue;
        }
        tracing::debug!("- {}", &text[decl.range.clone()]);

        let remaining: Vec<&NamedImport> = decl.named.iter().filter(|n| n.name != name).collect();
        removed += decl.named.len() - remaining.len();

        if !remaining.is_empty() {
            if let Some(range) = decl.named_range.clone() {
                let specs: Vec<&str> = remaining.iter().map(|n| n.text.as_str()).collect();
                edits.push(Edit::replace(range, format!("{{ {} }}", specs.join(", "))));
            }
            continue;
        }

        if decl.default.is_none() && decl.namespace.is_none() {
            tracing::debug!("Declaration remained empty, removing...");
            edits.push(Edit::delete(line_range(&text, decl.range.clone())));
            continue;
        }

        // Keep the default / namespace part of the clause.
        if let Some(clause) = decl.clause_range.clone() {
            let parts: Vec<&str> = [decl.default.clone(), decl.namespace.clone()]
                .into_iter()
                .flatten()
                .map(|r| &text[r])
                .collect();
            edits.push(Edit::replace(clause, parts.join(", ")));
        }
    }

    file.apply(edits)?;
    Ok(removed)
}

/// Make sure `import { name } from "module"` exists. Extends an existing
/// value import from `module` when there is one. Returns whether the file
/// changed.
pub fn ensure_named_import(file: &mut SourceFile, name: &str, module: &str) -> Result<bool> {
    let decls = import_declarations(file);

    if decls
        .iter()
        .any(|d| d.module == module && !d.type_only && d.imports(name))
    {
        return Ok(false);
    }

    let target = decls
        .iter()
        .find(|d| d.module == module && !d.type_only && d.namespace.is_none());

    let edit = match target {
        Some(decl) => match (&decl.named_range, decl.named.last(), &decl.default) {
            (Some(_), Some(last), _) => Edit::insert(last.range.end, format!(", {}", name)),
            (Some(range), None, _) => Edit::replace(range.clone(), format!("{{ {} }}", name)),
            (None, _, Some(default)) => Edit::insert(default.end, format!(", {{ {} }}", name)),
            (None, _, None) => new_import_edit(file, &decls, name, module),
        },
        None => new_import_edit(file, &decls, name, module),
    };

    tracing::debug!(path = %file.path().display(), "+ import {{ {} }} from \"{}\"", name, module);
    Ok(file.apply(vec![edit])? > 0)
}

fn new_import_edit(file: &SourceFile, decls: &[ImportDecl], name: &str, module: &str) -> Edit {
    let quote = decls.first().map(|d| d.quote).unwrap_or('"');
    let statement = format!("import {{ {} }} from {q}{}{q};", name, module, q = quote);

    if let Some(last) = decls.last() {
        return Edit::insert(last.range.end, format!("\n{}", statement));
    }

    // Keep directive prologues such as "use client" first.
    let directive_end = file
        .statements()
        .into_iter()
        .take_while(|s| {
            s.kind() == "expression_statement"
                && named_children(*s)
                    .first()
                    .map(|e| e.kind() == "string")
                    .unwrap_or(false)
        })
        .last()
        .map(|s| s.end_byte());

    match directive_end {
        Some(end) => Edit::insert(end, format!("\n{}", statement)),
        None => Edit::insert(0, format!("{}\n", statement)),
    }
}

/// Point a migrated identifier at its new module: drop `old_name` imports
/// from other modules and ensure `imported_name` is imported from `module`.
pub fn normalize_imports(
    file: &mut SourceFile,
    old_name: &str,
    imported_name: &str,
    module: &str,
) -> Result<bool> {
    let removed = remove_named_import(file, old_name, Some(module))?;
    let added = ensure_named_import(file, imported_name, module)?;
    Ok(removed > 0 || added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> SourceFile {
        SourceFile::parse("test.ts", src).unwrap()
    }

    #[test]
    fn test_import_declarations() {
        let file = parse("import React, { useState as s, type FC } from 'react';\nimport * as ns from \"./ns\";\nimport './styles.css';\n");
        let decls = import_declarations(&file);
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[0].module, "react");
        assert_eq!(decls[0].quote, '\'');
        assert!(decls[0].default.is_some());
        let names: Vec<_> = decls[0].named.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["useState", "FC"]);
        assert!(decls[1].namespace.is_some());
        assert!(decls[2].clause_range.is_none());
    }

    #[test]
    fn test_remove_drops_emptied_declaration() {
        let mut file = parse("import { getFoo } from './selectors';\nimport './styles.css';\n\ngetFoo();\n");
        assert_eq!(remove_named_import(&mut file, "getFoo", Some("@app/customer")).unwrap(), 1);
        assert_eq!(file.text(), "import './styles.css';\n\ngetFoo();\n");
    }

    #[test]
    fn test_remove_keeps_siblings_and_default() {
        let mut file = parse("import a, { getFoo, getBar } from './selectors';\nimport b, { getFoo as f } from './other';\n");
        assert_eq!(remove_named_import(&mut file, "getFoo", None).unwrap(), 2);
        assert_eq!(
            file.text(),
            "import a, { getBar } from './selectors';\nimport b from './other';\n"
        );
    }

    #[test]
    fn test_remove_keeps_target_module() {
        let mut file = parse("import { getFoo } from '@app/customer';\n");
        assert_eq!(remove_named_import(&mut file, "getFoo", Some("@app/customer")).unwrap(), 0);
        assert!(!file.is_dirty());
    }

    #[test]
    fn test_ensure_appends_new_declaration() {
        let mut file = parse("import React from 'react';\n\nuseFoo();\n");
        assert!(ensure_named_import(&mut file, "useFoo", "@app/customer").unwrap());
        assert_eq!(
            file.text(),
            "import React from 'react';\nimport { useFoo } from '@app/customer';\n\nuseFoo();\n"
        );
    }

    #[test]
    fn test_ensure_extends_existing_declaration() {
        let mut file = parse("import { useBar } from \"@app/customer\";\n");
        assert!(ensure_named_import(&mut file, "useFoo", "@app/customer").unwrap());
        assert_eq!(file.text(), "import { useBar, useFoo } from \"@app/customer\";\n");
        assert!(!ensure_named_import(&mut file, "useFoo", "@app/customer").unwrap());
    }

    #[test]
    fn test_ensure_skips_type_only_import() {
        let mut file = parse("import type { Foo } from \"@app/customer\";\n");
        assert!(ensure_named_import(&mut file, "useFoo", "@app/customer").unwrap());
        assert_eq!(
            file.text(),
            "import type { Foo } from \"@app/customer\";\nimport { useFoo } from \"@app/customer\";\n"
        );
    }

    #[test]
    fn test_ensure_without_imports_respects_directive() {
        let mut file = parse("\"use client\";\n\nuseFoo();\n");
        ensure_named_import(&mut file, "useFoo", "@app/customer").unwrap();
        assert_eq!(
            file.text(),
            "\"use client\";\nimport { useFoo } from \"@app/customer\";\n\nuseFoo();\n"
        );

        let mut bare = parse("useFoo();\n");
        ensure_named_import(&mut bare, "useFoo", "@app/customer").unwrap();
        assert_eq!(bare.text(), "import { useFoo } from \"@app/customer\";\nuseFoo();\n");
    }

    #[test]
    fn test_imported_elsewhere() {
        let file = parse("import { getFoo } from '../selectors';\n");
        assert!(imported_elsewhere(&file, "getFoo", "@app/customer"));
        assert!(!imported_elsewhere(&file, "getBar", "@app/customer"));

        let file = parse("import { getFoo } from '@app/customer';\n");
        assert!(!imported_elsewhere(&file, "getFoo", "@app/customer"));
    }

    #[test]
    fn test_normalize_imports() {
        let mut file = parse("import { getFoo, other } from '../selectors';\n\nconst x = useFoo();\n");
        assert!(normalize_imports(&mut file, "getFoo", "useFoo", "@app/customer").unwrap());
        assert_eq!(
            file.text(),
            "import { other } from '../selectors';\nimport { useFoo } from '@app/customer';\n\nconst x = useFoo();\n"
        );
        assert!(!normalize_imports(&mut file, "getFoo", "useFoo", "@app/customer").unwrap());
    }
}
