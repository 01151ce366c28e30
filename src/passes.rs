//! Pass descriptors
//!
//! A pass pairs one matcher with one rewrite action and carries the names it
//! needs. The [`crate::pipeline::Pipeline`] runs an ordered list of passes,
//! one full traversal of the project each.

use crate::config::{MigrateConfig, MigrationParams};
use crate::error::Result;
use crate::imports::{ensure_named_import, imported_elsewhere, remove_named_import};
use crate::matchers::{self, SagaAction};
use crate::rewrite::{self, delete_statement, rename_call, replace_node};
use crate::syntax::{Edit, SourceFile};
use crate::util::{hook_name, slash_path};
use tree_sitter::Node;

/// Import normalization applied to files a pass touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTarget {
    /// Named import being retired
    pub old_name: String,
    /// Named import that replaces it
    pub imported: String,
    /// Module the replacement is imported from
    pub module: String,
}

/// One matcher + rewrite action pair
pub trait Pass {
    /// Checkpoint name used in logs and reports
    fn name(&self) -> &str;

    /// Rewrite one file in place. Returns the number of rewrites; zero leaves
    /// the file untouched.
    fn apply(&self, file: &mut SourceFile) -> Result<usize>;

    /// Imports to normalize in touched files, if any.
    fn import_target(&self) -> Option<ImportTarget> {
        None
    }
}

/// Collect edits from every node of the file, log them and apply the batch.
fn rewrite_nodes<F>(file: &mut SourceFile, mut rewrite: F) -> Result<usize>
where
    F: FnMut(&SourceFile, Node<'_>) -> Vec<Edit>,
{
    let snapshot: &SourceFile = file;
    let edits: Vec<Edit> = snapshot
        .descendants()
        .into_iter()
        .flat_map(|node| rewrite(snapshot, node))
        .collect();
    if edits.is_empty() {
        return Ok(0);
    }

    tracing::debug!(path = %snapshot.path().display(), edits = edits.len(), "Rewriting");
    for edit in &edits {
        tracing::debug!("- {}", &snapshot.text()[edit.range.clone()]);
        tracing::debug!("+ {}", edit.replacement);
    }
    file.apply(edits)
}

/// Retire a selector definition: `function old() {}` and its JSDoc are
/// deleted, but only in files whose path contains `path_prefix`. An empty
/// prefix disables the pass.
#[derive(Debug, Clone)]
pub struct DeleteDefinition {
    pub name: String,
    pub path_prefix: String,
}

impl Pass for DeleteDefinition {
    fn name(&self) -> &str {
        "remove definition"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        if self.path_prefix.is_empty() || !slash_path(file.path()).contains(&self.path_prefix) {
            return Ok(0);
        }
        let applied = rewrite_nodes(file, |f, node| {
            matchers::function_definition(f, node, &self.name)
                .map(|def| vec![delete_statement(f.text(), def.with_docs)])
                .unwrap_or_default()
        })?;
        if applied > 0 {
            tracing::info!(
                "Deleted function '{}' and its JSDoc comment from file: {}",
                self.name,
                file.path().display()
            );
        }
        Ok(applied)
    }
}

/// `old(state)` becomes `new()`
#[derive(Debug, Clone)]
pub struct StateAccessor {
    pub old_name: String,
    pub new_name: String,
    pub module: String,
}

impl Pass for StateAccessor {
    fn name(&self) -> &str {
        "getStateReplacer"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        rewrite_nodes(file, |f, node| {
            if matchers::is_state_accessor(f, node, &self.old_name) {
                rename_call(f, node, &self.new_name)
            } else {
                Vec::new()
            }
        })
    }

    fn import_target(&self) -> Option<ImportTarget> {
        Some(ImportTarget {
            old_name: self.old_name.clone(),
            imported: self.new_name.clone(),
            module: self.module.clone(),
        })
    }
}

/// `useSelector(old)` / `useReduxState(old)` becomes `useNew()`
#[derive(Debug, Clone)]
pub struct HookUsage {
    pub old_name: String,
    pub hook: String,
    pub module: String,
}

impl Pass for HookUsage {
    fn name(&self) -> &str {
        "useReduxState/useSelector replacer"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        rewrite_nodes(file, |f, node| {
            if matchers::is_hook_usage(f, node, &self.old_name) {
                vec![replace_node(node, format!("{}()", self.hook))]
            } else {
                Vec::new()
            }
        })
    }

    fn import_target(&self) -> Option<ImportTarget> {
        Some(ImportTarget {
            old_name: self.old_name.clone(),
            imported: self.hook.clone(),
            module: self.module.clone(),
        })
    }
}

/// `useOnceFromReduxState(old)` becomes `useOnce(useNew())`
#[derive(Debug, Clone)]
pub struct OnceHookUsage {
    pub old_name: String,
    pub hook: String,
    pub module: String,
}

impl Pass for OnceHookUsage {
    fn name(&self) -> &str {
        "useOnceFromReduxState replacer"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        rewrite_nodes(file, |f, node| {
            if matchers::is_once_hook_usage(f, node, &self.old_name) {
                vec![replace_node(node, format!("useOnce({}())", self.hook))]
            } else {
                Vec::new()
            }
        })
    }

    fn import_target(&self) -> Option<ImportTarget> {
        Some(ImportTarget {
            old_name: self.old_name.clone(),
            imported: self.hook.clone(),
            module: self.module.clone(),
        })
    }
}

/// `yield select(old)` becomes `yield new()`
#[derive(Debug, Clone)]
pub struct YieldSelect {
    pub old_name: String,
    pub new_name: String,
    pub module: String,
}

impl Pass for YieldSelect {
    fn name(&self) -> &str {
        "yieldSelectReplacer"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        rewrite_nodes(file, |f, node| {
            if matchers::is_yield_select(f, node, &self.old_name) {
                vec![replace_node(node, format!("yield {}()", self.new_name))]
            } else {
                Vec::new()
            }
        })
    }

    fn import_target(&self) -> Option<ImportTarget> {
        Some(ImportTarget {
            old_name: self.old_name.clone(),
            imported: self.new_name.clone(),
            module: self.module.clone(),
        })
    }
}

/// `fn(old)` becomes `fn(new)` wherever `old` is passed as an argument
#[derive(Debug, Clone)]
pub struct ArgumentPassthrough {
    pub old_name: String,
    pub new_name: String,
    pub module: String,
}

impl Pass for ArgumentPassthrough {
    fn name(&self) -> &str {
        "replace occurrences where is function argument"
    }

    /// With `old == new` the rename is a no-op, but a file still importing
    /// `old` from another module counts as touched so its import moves.
    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        let mut matched = 0;
        let applied = rewrite_nodes(file, |f, node| {
            let args = matchers::passthrough_arguments(f, node, &self.old_name);
            matched += args.len();
            args.into_iter()
                .map(|arg| replace_node(arg, self.new_name.clone()))
                .collect()
        })?;
        if applied == 0 && matched > 0 && imported_elsewhere(file, &self.old_name, &self.module) {
            tracing::debug!(path = %file.path().display(), "Passthrough unchanged, import still needs moving");
            return Ok(matched);
        }
        Ok(applied)
    }

    fn import_target(&self) -> Option<ImportTarget> {
        Some(ImportTarget {
            old_name: self.old_name.clone(),
            imported: self.new_name.clone(),
            module: self.module.clone(),
        })
    }
}

/// `connect(state => ({ prop: old() }))` props injected via the store HOC
#[derive(Debug, Clone)]
pub struct ConnectedProps {
    pub old_name: String,
    pub hook: String,
    pub module: String,
    pub hoc_module: String,
}

impl Pass for ConnectedProps {
    fn name(&self) -> &str {
        "replace occurrences where is connector"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        let migrated =
            rewrite::migrate_connected_props(file, &self.old_name, &self.hook, &self.hoc_module)?;
        Ok(usize::from(migrated))
    }

    fn import_target(&self) -> Option<ImportTarget> {
        Some(ImportTarget {
            old_name: self.old_name.clone(),
            imported: self.hook.clone(),
            module: self.module.clone(),
        })
    }
}

/// Move a named import to another module across the project. Files already
/// importing it from `module` are left alone.
#[derive(Debug, Clone)]
pub struct RelocateImport {
    pub name: String,
    pub module: String,
}

impl Pass for RelocateImport {
    fn name(&self) -> &str {
        "relocate import"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        let removed = remove_named_import(file, &self.name, Some(&self.module))?;
        if removed == 0 {
            return Ok(0);
        }
        tracing::debug!(path = %file.path().display(), "Updating import");
        ensure_named_import(file, &self.name, &self.module)?;
        Ok(removed)
    }
}

/// Shared settings of the store action passes
#[derive(Debug, Clone)]
pub struct StoreActions {
    /// Redux slice being retired
    pub slice: String,
    /// Facade exposing the new actions
    pub facade: String,
    /// Module exporting the facade
    pub module: String,
    /// Files whose path contains this are skipped
    pub skip_path: String,
}

impl StoreActions {
    fn skips(&self, file: &SourceFile) -> bool {
        !self.skip_path.is_empty() && slash_path(file.path()).contains(&self.skip_path)
    }

    fn facade_member(&self, action: &str) -> String {
        format!("{}.actions.{}", self.facade, action)
    }

    /// Apply `rewrite` and import the facade when anything changed.
    fn rewrite_with_facade<F>(&self, file: &mut SourceFile, rewrite: F) -> Result<usize>
    where
        F: FnMut(&SourceFile, Node<'_>) -> Vec<Edit>,
    {
        if self.skips(file) {
            return Ok(0);
        }
        let applied = rewrite_nodes(file, rewrite)?;
        if applied > 0 {
            ensure_named_import(file, &self.facade, &self.module)?;
        }
        Ok(applied)
    }
}

/// `store.dispatch(slice.actions.X(args))` becomes `Facade.actions.X(args)`
#[derive(Debug, Clone)]
pub struct StoreDispatch(pub StoreActions);

impl Pass for StoreDispatch {
    fn name(&self) -> &str {
        "store dispatch replacer"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        let store = &self.0;
        store.rewrite_with_facade(file, |f, node| {
            matchers::store_dispatch(f, node, &store.slice)
                .map(|call| vec![replace_node(node, call.render(&store.facade))])
                .unwrap_or_default()
        })
    }
}

/// `take|call|put(slice.actions.X)` arguments point at `Facade.actions.X`
#[derive(Debug, Clone)]
pub struct SagaEffects(pub StoreActions);

impl Pass for SagaEffects {
    fn name(&self) -> &str {
        "saga effect replacer"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        let store = &self.0;
        store.rewrite_with_facade(file, |f, node| {
            matchers::saga_actions(f, node, &store.slice)
                .into_iter()
                .map(|found| match found {
                    SagaAction::Member { range, action } => {
                        Edit::replace(range, store.facade_member(&action))
                    }
                    SagaAction::Call { range, call } => {
                        Edit::replace(range, call.render(&store.facade))
                    }
                })
                .collect()
        })
    }
}

/// `useReduxAction(slice.actions.X)` becomes `Facade.actions.X`
#[derive(Debug, Clone)]
pub struct ActionHook(pub StoreActions);

impl Pass for ActionHook {
    fn name(&self) -> &str {
        "useReduxAction replacer"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        let store = &self.0;
        store.rewrite_with_facade(file, |f, node| {
            matchers::action_hook(f, node, &store.slice)
                .map(|action| vec![replace_node(node, store.facade_member(&action))])
                .unwrap_or_default()
        })
    }
}

/// `connect(mapState, { prop: slice.actions... })` binds `Facade.actions` instead
#[derive(Debug, Clone)]
pub struct DispatchBindings(pub StoreActions);

impl Pass for DispatchBindings {
    fn name(&self) -> &str {
        "connect dispatch binding replacer"
    }

    fn apply(&self, file: &mut SourceFile) -> Result<usize> {
        let store = &self.0;
        let container = format!("{}.actions", store.facade);
        store.rewrite_with_facade(file, |f, node| {
            matchers::dispatch_bindings(f, node, &store.slice)
                .into_iter()
                .map(|range| Edit::replace(range, container.clone()))
                .collect()
        })
    }
}

/// The selector migration, in order: retire the definition, then rewrite
/// accessor calls, hooks, once hooks, saga reads, passthrough arguments and
/// connected props.
pub fn migration_passes(params: &MigrationParams, config: &MigrateConfig) -> Vec<Box<dyn Pass>> {
    let old_name = params.old_name.clone();
    let new_name = params.new_name.clone();
    let module = params.module_specifier.clone();
    let hook = hook_name(&new_name);

    vec![
        Box::new(DeleteDefinition {
            name: old_name.clone(),
            path_prefix: config.definition_path_prefix.clone(),
        }),
        Box::new(StateAccessor {
            old_name: old_name.clone(),
            new_name: new_name.clone(),
            module: module.clone(),
        }),
        Box::new(HookUsage {
            old_name: old_name.clone(),
            hook: hook.clone(),
            module: module.clone(),
        }),
        Box::new(OnceHookUsage {
            old_name: old_name.clone(),
            hook: hook.clone(),
            module: module.clone(),
        }),
        Box::new(YieldSelect {
            old_name: old_name.clone(),
            new_name: new_name.clone(),
            module: module.clone(),
        }),
        Box::new(ArgumentPassthrough {
            old_name: old_name.clone(),
            new_name,
            module: module.clone(),
        }),
        Box::new(ConnectedProps {
            old_name,
            hook,
            module,
            hoc_module: config.hoc_module.clone(),
        }),
    ]
}

/// Connected-prop passes for a batch of getters moved to `module`.
pub fn connector_passes(getters: &[String], module: &str, config: &MigrateConfig) -> Vec<Box<dyn Pass>> {
    getters
        .iter()
        .map(|getter| {
            Box::new(ConnectedProps {
                old_name: getter.clone(),
                hook: hook_name(getter),
                module: module.to_string(),
                hoc_module: config.hoc_module.clone(),
            }) as Box<dyn Pass>
        })
        .collect()
}

/// Store action passes: dispatch calls, saga effects, action hooks and
/// `connect` dispatch bindings.
pub fn store_passes(config: &MigrateConfig) -> Vec<Box<dyn Pass>> {
    let store = StoreActions {
        slice: config.store.slice.clone(),
        facade: config.store.facade.clone(),
        module: config.store.module.clone(),
        skip_path: config.store.skip_path.clone(),
    };
    vec![
        Box::new(StoreDispatch(store.clone())),
        Box::new(SagaEffects(store.clone())),
        Box::new(ActionHook(store.clone())),
        Box::new(DispatchBindings(store)),
    ]
}
