// crates/carto-core/src/text.rs

/// Convert a string into a folded key suitable for comparison.
///
/// This performs:
/// 1\) Transliterate Unicode → ASCII (e.g. `Fès` -> `Fes`)
/// 2\) Normalize to lowercase
///
/// # Examples
///
/// ```rust
/// use carto_core::text::fold_key;
///
/// assert_eq!(fold_key("Fès"), "fes");
/// assert_eq!(fold_key("KÉNITRA"), "kenitra");
/// ```
pub fn fold_key(s: &str) -> String {
    deunicode::deunicode(s).to_lowercase()
}

/// Accent-insensitive and case-insensitive substring test.
///
/// An empty needle matches everything, which is what a cleared filter box
/// expects.
pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    let needle = fold_key(needle.trim());
    needle.is_empty() || fold_key(haystack).contains(&needle)
}
