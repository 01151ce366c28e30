//! Pattern matchers
//!
//! Each matcher inspects one node and decides whether it has a specific
//! call shape. Matching is by node kind and raw source text only: an aliased
//! import or a differently spelled but equivalent expression does not match.
//! Matchers never mutate the tree.

use crate::syntax::{call_arguments, named_children, subtree, unquote, SourceFile};
use std::ops::Range;
use tree_sitter::Node;

/// Hooks that read a selector from the redux store
pub const REDUX_STATE_HOOKS: &[&str] = &["useReduxState", "useSelector"];

/// Hook that reads a selector once from the redux store
pub const ONCE_STATE_HOOK: &str = "useOnceFromReduxState";

/// Saga effects that take an action creator or action
pub const SAGA_EFFECTS: &[&str] = &["take", "call", "put"];

/// Callees that dispatch an action to the store
pub const DISPATCH_CALLEES: &[&str] = &["store.dispatch", "dispatch"];

/// Hook that binds an action creator to dispatch
pub const ACTION_HOOK: &str = "useReduxAction";

/// Source text of a call's callee
pub fn callee_text<'f>(file: &'f SourceFile, call: Node<'_>) -> Option<&'f str> {
    if call.kind() != "call_expression" {
        return None;
    }
    call.child_by_field_name("function")
        .map(|callee| file.node_text(callee))
}

/// `call(arg)` where the callee is one of `callees` and the sole argument's
/// text is `arg`.
fn is_call_with_sole_argument(file: &SourceFile, node: Node<'_>, callees: &[&str], arg: &str) -> bool {
    let Some(callee) = callee_text(file, node) else {
        return false;
    };
    if !callees.contains(&callee) {
        return false;
    }
    let args = call_arguments(node);
    args.len() == 1 && file.node_text(args[0]) == arg
}

/// State-accessor shape: `name(state)` with exactly one argument.
pub fn is_state_accessor(file: &SourceFile, node: Node<'_>, name: &str) -> bool {
    callee_text(file, node) == Some(name) && call_arguments(node).len() == 1
}

/// Hook-usage shape: `useReduxState(name)` or `useSelector(name)`.
pub fn is_hook_usage(file: &SourceFile, node: Node<'_>, name: &str) -> bool {
    is_call_with_sole_argument(file, node, REDUX_STATE_HOOKS, name)
}

/// Once-hook shape: `useOnceFromReduxState(name)`.
pub fn is_once_hook_usage(file: &SourceFile, node: Node<'_>, name: &str) -> bool {
    is_call_with_sole_argument(file, node, &[ONCE_STATE_HOOK], name)
}

/// Generator state read: `yield select(name)`. `node` is the yield expression.
pub fn is_yield_select(file: &SourceFile, node: Node<'_>, name: &str) -> bool {
    if node.kind() != "yield_expression" {
        return false;
    }
    // `yield* select(x)` delegates and is not a state read.
    let mut cursor = node.walk();
    if node.children(&mut cursor).any(|c| c.kind() == "*") {
        return false;
    }
    match named_children(node).first() {
        Some(&inner) => is_call_with_sole_argument(file, inner, &["select"], name),
        None => false,
    }
}

/// Argument passthrough: every argument of `node` whose text is `name`.
pub fn passthrough_arguments<'t>(file: &SourceFile, node: Node<'t>, name: &str) -> Vec<Node<'t>> {
    if node.kind() != "call_expression" {
        return Vec::new();
    }
    call_arguments(node)
        .into_iter()
        .filter(|arg| file.node_text(*arg) == name)
        .collect()
}

/// `connect(...)` call
pub fn is_connect_call(file: &SourceFile, node: Node<'_>) -> bool {
    callee_text(file, node) == Some("connect")
}

fn is_function_like(node: Node<'_>) -> bool {
    matches!(node.kind(), "arrow_function" | "function_expression" | "function")
}

/// A `key: name()` entry inside a `connect` map-state function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedProp {
    /// Prop key as written, quotes removed
    pub key: String,
    /// Range of the whole `key: value` pair
    pub range: Range<usize>,
}

/// Connected-prop shape: the first argument of `connect` is a function and
/// contains `key: name()` properties.
pub fn connected_props(file: &SourceFile, connect_call: Node<'_>, name: &str) -> Vec<ConnectedProp> {
    if !is_connect_call(file, connect_call) {
        return Vec::new();
    }
    let args = call_arguments(connect_call);
    let Some(&map_state) = args.first() else {
        return Vec::new();
    };
    if !is_function_like(map_state) {
        return Vec::new();
    }

    let accessor = format!("{}()", name);
    subtree(map_state)
        .into_iter()
        .filter(|n| n.kind() == "pair")
        .filter_map(|pair| {
            let value = pair.child_by_field_name("value")?;
            if file.node_text(value) != accessor {
                return None;
            }
            let key = pair.child_by_field_name("key")?;
            Some(ConnectedProp {
                key: unquote(file.node_text(key)).to_string(),
                range: pair.byte_range(),
            })
        })
        .collect()
}

/// `<slice>.actions.<action>` member expression; returns the action name.
pub fn slice_action_member(file: &SourceFile, node: Node<'_>, slice: &str) -> Option<String> {
    if node.kind() != "member_expression" {
        return None;
    }
    let object = node.child_by_field_name("object")?;
    if file.node_text(object) != format!("{}.actions", slice) {
        return None;
    }
    let property = node.child_by_field_name("property")?;
    Some(file.node_text(property).to_string())
}

/// A call to a slice action creator: `<slice>.actions.<action>(args)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCall {
    pub action: String,
    pub args: Vec<String>,
}

impl ActionCall {
    /// Render against another container: `Facade.actions.action(args)`
    pub fn render(&self, container: &str) -> String {
        format!("{}.actions.{}({})", container, self.action, self.args.join(", "))
    }
}

/// `<slice>.actions.<action>(args)`
pub fn slice_action_call(file: &SourceFile, node: Node<'_>, slice: &str) -> Option<ActionCall> {
    if node.kind() != "call_expression" {
        return None;
    }
    let callee = node.child_by_field_name("function")?;
    let action = slice_action_member(file, callee, slice)?;
    let args = call_arguments(node)
        .into_iter()
        .map(|a| file.node_text(a).to_string())
        .collect();
    Some(ActionCall { action, args })
}

/// Store-dispatch shape: `store.dispatch(<slice>.actions.X(args))` or
/// `dispatch(...)`.
pub fn store_dispatch(file: &SourceFile, node: Node<'_>, slice: &str) -> Option<ActionCall> {
    let callee = callee_text(file, node)?;
    if !DISPATCH_CALLEES.contains(&callee) {
        return None;
    }
    let first = *call_arguments(node).first()?;
    slice_action_call(file, first, slice)
}

/// A saga effect argument referring to a slice action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaAction {
    /// `take(<slice>.actions.X)`: the member expression range and action
    Member { range: Range<usize>, action: String },
    /// `put(<slice>.actions.X(args))`: the inner call range and call
    Call { range: Range<usize>, call: ActionCall },
}

/// Saga-effect shape: slice actions passed to `take`, `call` or `put`.
pub fn saga_actions(file: &SourceFile, node: Node<'_>, slice: &str) -> Vec<SagaAction> {
    match callee_text(file, node) {
        Some(callee) if SAGA_EFFECTS.contains(&callee) => {}
        _ => return Vec::new(),
    }
    call_arguments(node)
        .into_iter()
        .filter_map(|arg| {
            if let Some(action) = slice_action_member(file, arg, slice) {
                return Some(SagaAction::Member {
                    range: arg.byte_range(),
                    action,
                });
            }
            slice_action_call(file, arg, slice).map(|call| SagaAction::Call {
                range: arg.byte_range(),
                call,
            })
        })
        .collect()
}

/// Action-hook shape: `useReduxAction(<slice>.actions.X)`; returns `X`.
pub fn action_hook(file: &SourceFile, node: Node<'_>, slice: &str) -> Option<String> {
    if callee_text(file, node)? != ACTION_HOOK {
        return None;
    }
    let first = *call_arguments(node).first()?;
    slice_action_member(file, first, slice)
}

/// Dispatch-binding shape: `connect(mapState, { prop: <slice>.actions... })`.
/// Returns the ranges of `<slice>.actions` prefixes inside the property values.
pub fn dispatch_bindings(file: &SourceFile, connect_call: Node<'_>, slice: &str) -> Vec<Range<usize>> {
    if !is_connect_call(file, connect_call) {
        return Vec::new();
    }
    let args = call_arguments(connect_call);
    let Some(&map_dispatch) = args.get(1) else {
        return Vec::new();
    };
    if map_dispatch.kind() != "object" {
        return Vec::new();
    }

    let prefix = format!("{}.actions", slice);
    named_children(map_dispatch)
        .into_iter()
        .filter(|p| p.kind() == "pair")
        .filter_map(|pair| pair.child_by_field_name("value"))
        .filter_map(|value| {
            let text = file.node_text(value);
            let rest = text.strip_prefix(prefix.as_str())?;
            if rest.is_empty() || rest.starts_with('.') || rest.starts_with('(') {
                let start = value.start_byte();
                Some(start..start + prefix.len())
            } else {
                None
            }
        })
        .collect()
}

/// A function definition to retire, with its leading JSDoc
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Statement range (the `export` wrapper when exported)
    pub statement: Range<usize>,
    /// Range including the JSDoc comments directly above
    pub with_docs: Range<usize>,
}

/// Definition shape: `function name() {}`, optionally exported.
pub fn function_definition(file: &SourceFile, node: Node<'_>, name: &str) -> Option<Definition> {
    if !matches!(
        node.kind(),
        "function_declaration" | "generator_function_declaration"
    ) {
        return None;
    }
    let decl_name = node.child_by_field_name("name")?;
    if file.node_text(decl_name) != name {
        return None;
    }

    let statement = match node.parent() {
        Some(parent) if parent.kind() == "export_statement" => parent,
        _ => node,
    };

    let mut start = statement.start_byte();
    let mut previous = statement.prev_sibling();
    while let Some(comment) = previous {
        if comment.kind() != "comment" || !file.node_text(comment).starts_with("/**") {
            break;
        }
        start = comment.start_byte();
        previous = comment.prev_sibling();
    }

    Some(Definition {
        statement: statement.byte_range(),
        with_docs: start..statement.end_byte(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(src: &str) -> SourceFile {
        SourceFile::parse("test.tsx", src).unwrap()
    }

    fn count_calls(src: &str, pred: impl Fn(&SourceFile, Node<'_>) -> bool) -> usize {
        let file = parse(src);
        file.descendants()
            .into_iter()
            .filter(|n| pred(&file, *n))
            .count()
    }

    #[rstest]
    #[case("getFoo(state);", 1)]
    #[case("getFoo(state, extra);", 0)]
    #[case("getFoo();", 0)]
    #[case("other.getFoo(state);", 0)]
    #[case("const x = getFoo(getState());", 1)]
    fn test_state_accessor(#[case] src: &str, #[case] expected: usize) {
        assert_eq!(
            count_calls(src, |f, n| is_state_accessor(f, n, "getFoo")),
            expected
        );
    }

    #[rstest]
    #[case("useSelector(getFoo);", 1)]
    #[case("useReduxState(getFoo);", 1)]
    #[case("useSelector(getFoo, shallowEqual);", 0)]
    #[case("useSelector(getBar);", 0)]
    #[case("useSelector((s) => getFoo(s));", 0)]
    fn test_hook_usage(#[case] src: &str, #[case] expected: usize) {
        assert_eq!(
            count_calls(src, |f, n| is_hook_usage(f, n, "getFoo")),
            expected
        );
    }

    #[test]
    fn test_once_hook_usage() {
        assert_eq!(
            count_calls("useOnceFromReduxState(getFoo);", |f, n| is_once_hook_usage(
                f, n, "getFoo"
            )),
            1
        );
    }

    #[rstest]
    #[case("function* saga() { const x = yield select(getFoo); }", 1)]
    #[case("function* saga() { const x = yield select(getFoo, 1); }", 0)]
    #[case("function* saga() { const x = yield call(getFoo); }", 0)]
    #[case("function* saga() { yield* select(getFoo); }", 0)]
    fn test_yield_select(#[case] src: &str, #[case] expected: usize) {
        assert_eq!(
            count_calls(src, |f, n| is_yield_select(f, n, "getFoo")),
            expected
        );
    }

    #[test]
    fn test_passthrough_arguments() {
        let file = parse("call(getFoo, 1, getFoo); call(getFooBar); call(x.getFoo);");
        let total: usize = file
            .descendants()
            .into_iter()
            .map(|n| passthrough_arguments(&file, n, "getFoo").len())
            .sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_connected_props() {
        let src = r#"
const connector = connect(
  (state) => ({ dealer: getFoo(), 'other': getFoo(), name: getName(state) }),
  { load },
);
"#;
        let file = parse(src);
        let call = file
            .descendants_of_kind("call_expression")
            .into_iter()
            .find(|n| is_connect_call(&file, *n))
            .unwrap();
        let props = connected_props(&file, call, "getFoo");
        let keys: Vec<_> = props.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["dealer", "other"]);
        assert_eq!(&src[props[0].range.clone()], "dealer: getFoo()");
    }

    #[test]
    fn test_connected_props_requires_function() {
        let file = parse("connect(mapState, { a: getFoo() });");
        let call = file.descendants_of_kind("call_expression")[0];
        assert!(connected_props(&file, call, "getFoo").is_empty());
    }

    #[test]
    fn test_store_dispatch() {
        let file = parse("store.dispatch(customerSlice.actions.setName(a, b)); dispatch(other.actions.x());");
        let matches: Vec<_> = file
            .descendants_of_kind("call_expression")
            .into_iter()
            .filter_map(|n| store_dispatch(&file, n, "customerSlice"))
            .collect();
        assert_eq!(
            matches,
            vec![ActionCall {
                action: "setName".into(),
                args: vec!["a".into(), "b".into()],
            }]
        );
        assert_eq!(matches[0].render("Customer"), "Customer.actions.setName(a, b)");
    }

    #[test]
    fn test_saga_actions() {
        let src = "function* s() { yield take(customerSlice.actions.load); yield put(customerSlice.actions.done(1)); }";
        let file = parse(src);
        let found: Vec<_> = file
            .descendants_of_kind("call_expression")
            .into_iter()
            .flat_map(|n| saga_actions(&file, n, "customerSlice"))
            .collect();
        assert_eq!(found.len(), 2);
        assert!(matches!(&found[0], SagaAction::Member { action, .. } if action == "load"));
        assert!(matches!(&found[1], SagaAction::Call { call, .. } if call.action == "done"));
    }

    #[test]
    fn test_action_hook() {
        let file = parse("const load = useReduxAction(customerSlice.actions.load);");
        let found: Vec<_> = file
            .descendants_of_kind("call_expression")
            .into_iter()
            .filter_map(|n| action_hook(&file, n, "customerSlice"))
            .collect();
        assert_eq!(found, vec!["load".to_string()]);
    }

    #[test]
    fn test_dispatch_bindings() {
        let src = "connect(null, { actions: customerSlice.actions, load: customerSlice.actions.load, x: customerSliceX });";
        let file = parse(src);
        let call = file.descendants_of_kind("call_expression")[0];
        let ranges = dispatch_bindings(&file, call, "customerSlice");
        assert_eq!(ranges.len(), 2);
        for range in ranges {
            assert_eq!(&src[range], "customerSlice.actions");
        }
    }

    #[test]
    fn test_function_definition_with_jsdoc() {
        let src = "import x from 'y';\n\n/**\n * Docs\n */\nexport function getFoo(state) {\n  return state.foo;\n}\n";
        let file = parse(src);
        let defs: Vec<_> = file
            .descendants()
            .into_iter()
            .filter_map(|n| function_definition(&file, n, "getFoo"))
            .collect();
        assert_eq!(defs.len(), 1);
        assert!(src[defs[0].with_docs.clone()].starts_with("/**"));
        assert!(src[defs[0].statement.clone()].starts_with("export function getFoo"));
    }
}
