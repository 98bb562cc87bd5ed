//! Utility functions for path manipulation

/// Check whether a name can be used as a single path component
///
/// Rejects empty names, `.` and `..`, and anything containing a path
/// separator or a NUL byte.
///
/// # Examples
///
/// ```
/// use csv_image_dl::utils::is_safe_component;
///
/// assert!(is_safe_component("photo.jpg"));
/// assert!(!is_safe_component("../photo.jpg"));
/// assert!(!is_safe_component(".."));
/// ```
#[must_use]
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Turn an arbitrary identifier into a single safe path component
///
/// Path separators and NUL bytes are replaced with `_` and surrounding
/// whitespace is trimmed. If nothing usable remains, `fallback` is returned.
///
/// # Examples
///
/// ```
/// use csv_image_dl::utils::sanitize_component;
///
/// assert_eq!(sanitize_component("SKU-1", "unknown"), "SKU-1");
/// assert_eq!(sanitize_component("a/b", "unknown"), "a_b");
/// assert_eq!(sanitize_component("  ", "unknown"), "unknown");
/// assert_eq!(sanitize_component("..", "unknown"), "unknown");
/// ```
#[must_use]
pub fn sanitize_component(name: &str, fallback: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    if is_safe_component(&cleaned) {
        cleaned
    } else {
        fallback.to_string()
    }
}
