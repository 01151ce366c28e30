//! Parsed source files and byte-span edits
//!
//! A [`SourceFile`] owns its text and the tree-sitter tree parsed from it.
//! Trees are immutable, so every mutation is expressed as a batch of
//! [`Edit`]s that is spliced into the text, after which the file is reparsed.
//! Nodes borrowed from the previous tree must not outlive [`SourceFile::apply`].

use crate::error::{Error, Result};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// Grammar used to parse a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    TypeScript,
    Tsx,
}

impl Dialect {
    /// Pick the grammar from the file extension. JSX-capable extensions use TSX.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("tsx") | Some("jsx") | Some("js") => Dialect::Tsx,
            _ => Dialect::TypeScript,
        }
    }

    fn parser(self) -> Result<Parser> {
        let mut parser = Parser::new();
        let language = match self {
            Dialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
            Dialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX,
        };
        parser
            .set_language(&language.into())
            .map_err(|e| Error::Other(format!("Failed to set language: {}", e)))?;
        Ok(parser)
    }
}

/// A single byte-span replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: Range<usize>,
    pub replacement: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self::replace(at..at, text)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::replace(range, String::new())
    }

    fn is_insert(&self) -> bool {
        self.range.is_empty()
    }

    /// Two edits conflict when their ranges share bytes. Pure insertions
    /// only conflict with a range strictly around them.
    fn conflicts_with(&self, other: &Edit) -> bool {
        if self.is_insert() && other.is_insert() {
            return false;
        }
        if self.is_insert() {
            return other.range.start < self.range.start && self.range.start < other.range.end;
        }
        if other.is_insert() {
            return other.conflicts_with(self);
        }
        self.range.start < other.range.end && other.range.start < self.range.end
    }
}

/// One parsed TypeScript or JavaScript file
pub struct SourceFile {
    path: PathBuf,
    text: String,
    tree: Tree,
    dialect: Dialect,
    dirty: bool,
}

impl std::fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFile")
            .field("path", &self.path)
            .field("dialect", &self.dialect)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl SourceFile {
    /// Parse `text` as the contents of `path`. Nothing is read from disk.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let text = text.into();
        let dialect = Dialect::for_path(&path);
        let tree = parse_tree(dialect, &path, &text)?;
        Ok(Self {
            path,
            text,
            tree,
            dialect,
            dirty: false,
        })
    }

    /// Read and parse a file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(path, text)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Whether the in-memory text differs from what was last persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Raw source text of a node
    pub fn node_text(&self, node: Node<'_>) -> &str {
        self.text.get(node.byte_range()).unwrap_or("")
    }

    /// All nodes of the tree in pre-order.
    pub fn descendants(&self) -> Vec<Node<'_>> {
        subtree(self.root())
    }

    /// All nodes of one kind, in pre-order.
    pub fn descendants_of_kind(&self, kind: &str) -> Vec<Node<'_>> {
        self.descendants()
            .into_iter()
            .filter(|n| n.kind() == kind)
            .collect()
    }

    /// Top-level statements of the program
    pub fn statements(&self) -> Vec<Node<'_>> {
        let root = self.root();
        let mut cursor = root.walk();
        root.named_children(&mut cursor).collect()
    }

    /// Splice a batch of edits into the text and reparse.
    ///
    /// Edits whose replacement equals the text they cover are dropped. When
    /// two edits overlap, the one that starts first (and then the wider one)
    /// wins. An insertion at the start of a replaced range lands before it.
    /// Returns the number of edits actually applied; the file becomes dirty
    /// when that number is non-zero.
    pub fn apply(&mut self, edits: Vec<Edit>) -> Result<usize> {
        let mut edits: Vec<Edit> = edits
            .into_iter()
            .filter(|e| e.range.end <= self.text.len() && e.range.start <= e.range.end)
            .filter(|e| self.text.get(e.range.clone()) != Some(e.replacement.as_str()))
            .collect();
        edits.sort_by(|a, b| {
            a.range
                .start
                .cmp(&b.range.start)
                .then(b.is_insert().cmp(&a.is_insert()))
                .then(b.range.end.cmp(&a.range.end))
        });

        let mut accepted: Vec<Edit> = Vec::with_capacity(edits.len());
        for edit in edits {
            if accepted.iter().any(|a| a.conflicts_with(&edit)) {
                tracing::debug!(
                    path = %self.path.display(),
                    start = edit.range.start,
                    "Dropping overlapping edit"
                );
                continue;
            }
            accepted.push(edit);
        }

        if accepted.is_empty() {
            return Ok(0);
        }

        // Apply back to front so earlier offsets stay valid. Among edits at
        // the same offset the insertion sorts first and must end up first.
        let mut text = self.text.clone();
        for edit in accepted.iter().rev() {
            text.replace_range(edit.range.clone(), &edit.replacement);
        }

        let applied = accepted.len();
        self.replace_text(text)?;
        Ok(applied)
    }

    /// Replace the whole text and reparse.
    pub fn replace_text(&mut self, text: String) -> Result<()> {
        if text == self.text {
            return Ok(());
        }
        self.tree = parse_tree(self.dialect, &self.path, &text)?;
        self.text = text;
        self.dirty = true;
        Ok(())
    }

    /// Write the text back to its path if it changed.
    pub fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        std::fs::write(&self.path, &self.text)?;
        self.dirty = false;
        Ok(true)
    }
}

fn parse_tree(dialect: Dialect, path: &Path, text: &str) -> Result<Tree> {
    let mut parser = dialect.parser()?;
    parser.parse(text, None).ok_or_else(|| Error::Parse {
        path: path.display().to_string(),
        message: "Failed to parse source".into(),
    })
}

/// `node` and everything beneath it, in pre-order.
pub fn subtree(node: Node<'_>) -> Vec<Node<'_>> {
    let mut nodes = Vec::new();
    // A cursor never climbs above the node it was created from.
    let mut cursor = node.walk();
    loop {
        nodes.push(cursor.node());
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return nodes;
            }
        }
    }
}

/// Named children excluding comments
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

/// Arguments of a `call_expression`. Tagged templates have none.
pub fn call_arguments(call: Node<'_>) -> Vec<Node<'_>> {
    match call.child_by_field_name("arguments") {
        Some(args) if args.kind() == "arguments" => named_children(args),
        _ => Vec::new(),
    }
}

/// Walk up to the statement that directly belongs to the program.
pub fn top_level_statement(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        let parent = current.parent()?;
        if parent.kind() == "program" {
            return Some(current);
        }
        current = parent;
    }
}

/// Extend a statement range so that deleting it removes the whole line:
/// leading indentation and one trailing newline.
pub fn line_range(text: &str, range: Range<usize>) -> Range<usize> {
    let bytes = text.as_bytes();
    let mut start = range.start;
    while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] != b'\n' {
        start = range.start;
    }

    let mut end = range.end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\r' {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    } else {
        end = range.end;
    }
    start..end
}

/// Unquote a string literal node text: `"foo"` or `'foo'` becomes `foo`.
pub fn unquote(literal: &str) -> &str {
    let trimmed = literal.trim();
    if trimmed.len() >= 2 {
        let first = trimmed.as_bytes()[0];
        let last = trimmed.as_bytes()[trimmed.len() - 1];
        if (first == b'"' || first == b'\'' || first == b'`') && first == last {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file(src: &str) -> SourceFile {
        SourceFile::parse("test.ts", src).unwrap()
    }

    #[test]
    fn test_dialect_for_path() {
        assert_eq!(Dialect::for_path(Path::new("a.ts")), Dialect::TypeScript);
        assert_eq!(Dialect::for_path(Path::new("a.tsx")), Dialect::Tsx);
        assert_eq!(Dialect::for_path(Path::new("a.jsx")), Dialect::Tsx);
    }

    #[test]
    fn test_apply_back_to_front() {
        let mut f = file("const a = foo(1);\nconst b = foo(2);\n");
        let calls = f.descendants_of_kind("call_expression");
        let edits = calls
            .iter()
            .map(|c| Edit::replace(c.byte_range(), "bar()"))
            .collect();
        assert_eq!(f.apply(edits).unwrap(), 2);
        assert_eq!(f.text(), "const a = bar();\nconst b = bar();\n");
        assert!(f.is_dirty());
    }

    #[test]
    fn test_noop_edits_are_dropped() {
        let mut f = file("foo(x);\n");
        let call = f.descendants_of_kind("call_expression")[0];
        let edit = Edit::replace(call.byte_range(), "foo(x)");
        assert_eq!(f.apply(vec![edit]).unwrap(), 0);
        assert!(!f.is_dirty());
    }

    #[test]
    fn test_overlap_keeps_outermost() {
        let mut f = file("outer(inner(x));\n");
        let calls = f.descendants_of_kind("call_expression");
        let edits = calls
            .iter()
            .map(|c| Edit::replace(c.byte_range(), "z()"))
            .collect();
        assert_eq!(f.apply(edits).unwrap(), 1);
        assert_eq!(f.text(), "z();\n");
    }

    #[test]
    fn test_insert_before_replacement_at_same_offset() {
        let mut f = file("type A = 1;\n");
        let stmt = f.statements()[0];
        let range = stmt.byte_range();
        let edits = vec![
            Edit::replace(range.clone(), "type A = 2;"),
            Edit::insert(range.start, "type B = 3;\n"),
        ];
        assert_eq!(f.apply(edits).unwrap(), 2);
        assert_eq!(f.text(), "type B = 3;\ntype A = 2;\n");
    }

    #[test]
    fn test_line_range() {
        let text = "a;\n  b;\nc;";
        let start = text.find("b;").unwrap();
        let r = line_range(text, start..start + 2);
        assert_eq!(&text[r], "  b;\n");
    }

    #[test]
    fn test_call_arguments_skip_comments() {
        let f = file("foo(/* first */ a, b);\n");
        let call = f.descendants_of_kind("call_expression")[0];
        let args: Vec<_> = call_arguments(call)
            .into_iter()
            .map(|a| f.node_text(a).to_string())
            .collect();
        assert_eq!(args, vec!["a", "b"]);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"@acme/lib\""), "@acme/lib");
        assert_eq!(unquote("'./x'"), "./x");
        assert_eq!(unquote("plain"), "plain");
    }
}
