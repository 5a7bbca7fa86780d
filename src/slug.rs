use nanoid::nanoid;
use uuid::Uuid;

/// Length of the random suffix appended to every slug.
pub const SUFFIX_LEN: usize = 8;

/// Width of the `bundle.slug` column.
pub const MAX_SLUG_LEN: usize = 120;

/// generate_slug
///
/// Derives a URL-safe slug from an optional title: lower-case, trim, collapse whitespace
/// runs into single hyphens, drop everything outside `[a-z0-9-]`, then append `-` and an
/// 8-character nanoid suffix. An empty or absent title yields only `-<suffix>`.
///
/// No uniqueness check happens here. A collision surfaces as a storage conflict.
pub fn generate_slug(title: Option<&str>) -> String {
    let base = slug_base(title.unwrap_or_default());
    format!("{}-{}", base, nanoid!(SUFFIX_LEN))
}

/// The deterministic, title-derived half of a slug.
pub fn slug_base(title: &str) -> String {
    let lowered = title.to_lowercase();

    let hyphenated = lowered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    hyphenated
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        // Leave room for the hyphen and suffix inside the column width.
        .take(MAX_SLUG_LEN - SUFFIX_LEN - 1)
        .collect()
}

/// generate_admin_token
///
/// A fresh random v4 UUID. Never derived from the title, never regenerated.
pub fn generate_admin_token() -> Uuid {
    Uuid::new_v4()
}
