/// Storage width of `groups.slug`.
pub const SLUG_MAX_LENGTH: usize = 100;

/// Derive a URL slug from a free-form title, transliterating non-Latin
/// scripts ("Заголовок" becomes "zagolovok"), cut to the column width.
pub fn derive_slug(title: &str) -> String {
    let full = ::slug::slugify(title);
    let cut: String = full.chars().take(SLUG_MAX_LENGTH).collect();
    cut.trim_end_matches('-').to_string()
}

/// Letters, digits, hyphens and underscores only.
pub fn is_valid_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
