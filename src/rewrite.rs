//! Rewrite actions
//!
//! Turn matched nodes into [`Edit`]s. Simple actions return edits for the
//! caller to batch; [`migrate_connected_props`] restructures a whole file in
//! several reparsed steps.

use crate::error::Result;
use crate::imports::ensure_named_import;
use crate::matchers::{connected_props, is_connect_call, ConnectedProp};
use crate::syntax::{call_arguments, line_range, named_children, top_level_statement, Edit, SourceFile};
use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;
use tree_sitter::Node;

/// Type alias collecting props injected by the store HOC
pub const CONNECTED_PROPS_TYPE: &str = "ZustandConnectedProps";

/// Component props alias extended with [`CONNECTED_PROPS_TYPE`]
pub const PROPS_TYPE: &str = "PropsT";

/// Higher-order component injecting hook values as props
pub const STORE_HOC: &str = "withZustandStore";

/// Name of the bound `connect(...)` result components are wrapped with
pub const CONNECTOR: &str = "connector";

/// `old(state)` becomes `new()`: rename the callee and drop the argument.
pub fn rename_call(file: &SourceFile, call: Node<'_>, new_name: &str) -> Vec<Edit> {
    let mut edits = Vec::new();
    if let Some(callee) = call.child_by_field_name("function") {
        if file.node_text(callee) != new_name {
            edits.push(Edit::replace(callee.byte_range(), new_name));
        }
    }
    if let Some(args) = call.child_by_field_name("arguments") {
        edits.push(Edit::replace(args.byte_range(), "()"));
    }
    edits
}

/// Replace a whole node with literal text.
pub fn replace_node(node: Node<'_>, text: impl Into<String>) -> Edit {
    Edit::replace(node.byte_range(), text)
}

/// Remove one property from an object literal together with its separator.
pub fn remove_property(text: &str, range: Range<usize>) -> Edit {
    let bytes = text.as_bytes();

    let mut end = range.end;
    while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b',' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_whitespace() {
            end += 1;
        }
        return Edit::delete(range.start..end);
    }

    // Last property: take the comma in front of it instead.
    let mut start = range.start;
    while start > 0 && bytes[start - 1].is_ascii_whitespace() {
        start -= 1;
    }
    if start > 0 && bytes[start - 1] == b',' {
        return Edit::delete(start - 1..range.end);
    }
    Edit::delete(range)
}

/// Delete a statement and its JSDoc, including the line it sits on.
pub fn delete_statement(text: &str, range: Range<usize>) -> Edit {
    Edit::delete(line_range(text, range))
}

/// `prop: ReturnType<typeof useFoo>`
pub fn connected_prop_entry(prop: &str, hook: &str) -> String {
    format!("{}: ReturnType<typeof {}>", prop, hook)
}

fn closing_brace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s;,]*\}\s*$").expect("static regex"))
}

/// Add entries to a type literal: `{ a: A }` becomes `{ a: A, b: B }`.
pub fn extend_type_literal(literal: &str, entries: &[String]) -> String {
    let joined = entries.join(", ");
    let trimmed = literal.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .map(str::trim);
    match inner {
        Some("") => format!("{{ {} }}", joined),
        _ => closing_brace()
            .replace(trimmed, format!(", {} }}", joined).as_str())
            .into_owned(),
    }
}

/// Operands of a possibly nested `A & B & C`, left to right.
fn intersection_parts<'t>(value: Node<'t>) -> Vec<Node<'t>> {
    if value.kind() != "intersection_type" {
        return vec![value];
    }
    named_children(value)
        .into_iter()
        .flat_map(intersection_parts)
        .collect()
}

/// `A` becomes `A & With`; unions and function types are parenthesized.
/// Returns `None` when the intersection is already there.
pub fn intersect_type(file: &SourceFile, value: Node<'_>, with: &str) -> Option<String> {
    let text = file.node_text(value);
    if intersection_parts(value)
        .iter()
        .any(|part| file.node_text(*part) == with)
    {
        return None;
    }
    match value.kind() {
        "union_type" | "function_type" | "conditional_type" | "constructor_type" => {
            Some(format!("({}) & {}", text, with))
        }
        _ => Some(format!("{} & {}", text, with)),
    }
}

fn find_type_alias<'t>(file: &'t SourceFile, name: &str) -> Option<Node<'t>> {
    file.descendants_of_kind("type_alias_declaration")
        .into_iter()
        .find(|alias| {
            alias
                .child_by_field_name("name")
                .map(|n| file.node_text(n) == name)
                .unwrap_or(false)
        })
}

/// Property names declared in an object type literal
fn object_type_keys(file: &SourceFile, value: Node<'_>) -> Vec<String> {
    if value.kind() != "object_type" {
        return Vec::new();
    }
    named_children(value)
        .into_iter()
        .filter_map(|member| member.child_by_field_name("name"))
        .map(|name| crate::syntax::unquote(file.node_text(name)).to_string())
        .collect()
}

/// `connector(Comp)` becomes `connector(withZustandStore({ prop: useFoo }, Comp))`.
/// A component already wrapped gets the new props added to its mapping.
pub fn wrap_connector_call(file: &SourceFile, call: Node<'_>, props: &[(String, String)]) -> Option<Edit> {
    let args = call_arguments(call);
    let component = *args.last()?;

    if crate::matchers::callee_text(file, component) == Some(STORE_HOC) {
        let inner = call_arguments(component);
        let mapping = *inner.first()?;
        if mapping.kind() != "object" {
            return None;
        }
        let existing: Vec<String> = named_children(mapping)
            .into_iter()
            .filter_map(|entry| match entry.kind() {
                "shorthand_property_identifier" => Some(entry),
                _ => entry.child_by_field_name("key"),
            })
            .map(|k| crate::syntax::unquote(file.node_text(k)).to_string())
            .collect();
        let missing: Vec<String> = props
            .iter()
            .filter(|(prop, _)| !existing.contains(prop))
            .map(|(prop, hook)| format!("{}: {}", prop, hook))
            .collect();
        if missing.is_empty() {
            return None;
        }
        let last_entry = named_children(mapping).last().copied();
        return Some(match last_entry {
            Some(last) => Edit::insert(last.end_byte(), format!(", {}", missing.join(", "))),
            None => Edit::replace(mapping.byte_range(), format!("{{ {} }}", missing.join(", "))),
        });
    }

    let mapping = props
        .iter()
        .map(|(prop, hook)| format!("{}: {}", prop, hook))
        .collect::<Vec<_>>()
        .join(", ");
    Some(Edit::replace(
        component.byte_range(),
        format!("{}({{ {} }}, {})", STORE_HOC, mapping, file.node_text(component)),
    ))
}

/// Move `prop: name()` entries out of `connect` map-state functions and
/// inject them through the store HOC instead.
///
/// Steps, each skipped silently when the file lacks the expected structure:
/// remove the props, create or extend [`CONNECTED_PROPS_TYPE`], intersect
/// [`PROPS_TYPE`] with it, wrap `connector(...)` calls and import the HOC.
/// Returns whether any prop was migrated.
pub fn migrate_connected_props(
    file: &mut SourceFile,
    name: &str,
    hook: &str,
    hoc_module: &str,
) -> Result<bool> {
    // Remove the props from every connect call.
    let mut removed: Vec<ConnectedProp> = Vec::new();
    for call in file.descendants_of_kind("call_expression") {
        if is_connect_call(file, call) {
            removed.extend(connected_props(file, call, name));
        }
    }
    if removed.is_empty() {
        return Ok(false);
    }

    let path = file.path().display().to_string();
    let edits: Vec<Edit> = removed
        .iter()
        .map(|prop| {
            tracing::debug!(path = %path, "- {}", &file.text()[prop.range.clone()]);
            remove_property(file.text(), prop.range.clone())
        })
        .collect();
    file.apply(edits)?;

    let mut keys: Vec<String> = Vec::new();
    for prop in removed {
        if !keys.contains(&prop.key) {
            keys.push(prop.key);
        }
    }

    // Declare the injected props and extend the component props with them.
    let mut edits = Vec::new();
    let props_alias = find_type_alias(file, PROPS_TYPE);

    match find_type_alias(file, CONNECTED_PROPS_TYPE).and_then(|a| a.child_by_field_name("value")) {
        Some(value) => {
            let present = object_type_keys(file, value);
            let entries: Vec<String> = keys
                .iter()
                .filter(|k| !present.contains(k))
                .map(|k| connected_prop_entry(k, hook))
                .collect();
            if !entries.is_empty() {
                let extended = extend_type_literal(file.node_text(value), &entries);
                tracing::debug!(path = %path, "+ {}", extended);
                edits.push(Edit::replace(value.byte_range(), extended));
            }
        }
        None => {
            let entries: Vec<String> = keys.iter().map(|k| connected_prop_entry(k, hook)).collect();
            let alias = format!("type {} = {{ {} }};\n\n", CONNECTED_PROPS_TYPE, entries.join(", "));
            let anchor = props_alias
                .and_then(top_level_statement)
                .or_else(|| {
                    file.descendants_of_kind("call_expression")
                        .into_iter()
                        .find(|c| is_connect_call(file, *c))
                        .and_then(top_level_statement)
                });
            match anchor {
                Some(stmt) => {
                    tracing::debug!(path = %path, "+ {}", alias.trim_end());
                    edits.push(Edit::insert(stmt.start_byte(), alias));
                }
                None => tracing::debug!(path = %path, "No statement to anchor {} to, skipping", CONNECTED_PROPS_TYPE),
            }
        }
    }

    match props_alias.and_then(|a| a.child_by_field_name("value")) {
        Some(value) => {
            if let Some(intersected) = intersect_type(file, value, CONNECTED_PROPS_TYPE) {
                tracing::debug!(path = %path, "+ type {} = {}", PROPS_TYPE, intersected);
                edits.push(Edit::replace(value.byte_range(), intersected));
            }
        }
        None => tracing::debug!(path = %path, "No {} alias found, skipping", PROPS_TYPE),
    }
    file.apply(edits)?;

    // Inject the hook values through the HOC.
    let mapping: Vec<(String, String)> = keys.iter().map(|k| (k.clone(), hook.to_string())).collect();
    let edits: Vec<Edit> = file
        .descendants_of_kind("call_expression")
        .into_iter()
        .filter(|c| crate::matchers::callee_text(file, *c) == Some(CONNECTOR))
        .filter_map(|c| wrap_connector_call(file, c, &mapping))
        .collect();
    if edits.is_empty() {
        tracing::debug!(path = %path, "No {}(...) call to wrap, skipping", CONNECTOR);
    }
    file.apply(edits)?;

    ensure_named_import(file, STORE_HOC, hoc_module)?;
    Ok(true)
}
