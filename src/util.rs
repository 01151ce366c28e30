//! Shared naming helpers
//!
//! Selector and hook names follow the `getFoo` / `useFoo` convention of the
//! store being migrated to.

/// Derive the hook name for a getter: `getFoo` becomes `useFoo`.
///
/// Names without a `get` prefix get `use` prepended to their PascalCase form.
///
/// # Examples
/// ```
/// use selector_migrate::util::hook_name;
/// assert_eq!(hook_name("getFoo"), "useFoo");
/// assert_eq!(hook_name("customerDealer"), "useCustomerDealer");
/// ```
pub fn hook_name(getter: &str) -> String {
    match getter.strip_prefix("get") {
        Some(rest) if !rest.is_empty() => format!("use{}", rest),
        _ => format!("use{}", capitalize(getter)),
    }
}

/// Upper-case the first character.
///
/// # Examples
/// ```
/// use selector_migrate::util::capitalize;
/// assert_eq!(capitalize("customer"), "Customer");
/// assert_eq!(capitalize(""), "");
/// ```
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Whether `s` is a plain JavaScript identifier (ASCII subset).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Forward-slash rendering of a path, used for path-prefix checks.
pub fn slash_path(path: &std::path::Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
