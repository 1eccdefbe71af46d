//! Tenant slug generation and validation.

use std::sync::LazyLock;

use regex::Regex;

pub const MAX_SLUG_LEN: usize = 50;
pub const MIN_SLUG_LEN: usize = 3;

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());
static SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// Derive a URL slug from a business name, e.g. `"Joe's Auto Spa"` -> `"joes-auto-spa"`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = DISALLOWED.replace_all(&lowered, "");
    let dashed = WHITESPACE.replace_all(stripped.trim(), "-");
    let collapsed = HYPHENS.replace_all(&dashed, "-");
    let truncated: String = collapsed.chars().take(MAX_SLUG_LEN).collect();
    truncated.trim_matches('-').to_string()
}

/// Base slug for a new tenant. Names with too few usable characters get a
/// generic stem so the result always passes [`validate_slug`] length rules.
pub fn tenant_slug(business_name: &str) -> String {
    let slug = slugify(business_name);
    match slug.len() {
        0 => "tenant".to_string(),
        n if n < MIN_SLUG_LEN => format!("{slug}-tenant"),
        _ => slug,
    }
}

/// Candidate slug for the n-th collision of `base` (`base`, `base-1`, `base-2`, ...).
/// The base is shortened when needed so the suffix fits in [`MAX_SLUG_LEN`].
pub fn with_suffix(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        return base.to_string();
    }
    let suffix = format!("-{attempt}");
    let room = MAX_SLUG_LEN.saturating_sub(suffix.len());
    let stem: String = base.chars().take(room).collect();
    format!("{}{suffix}", stem.trim_end_matches('-'))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("Slug must be between 3 and 50 characters long")]
    Length,
    #[error("Slug must contain only lowercase letters, numbers, and hyphens")]
    Characters,
    #[error("Slug cannot start or end with a hyphen")]
    EdgeHyphen,
    #[error("Slug cannot contain consecutive hyphens")]
    ConsecutiveHyphens,
}

pub fn validate_slug(slug: &str) -> Result<(), SlugError> {
    if slug.len() < MIN_SLUG_LEN || slug.len() > MAX_SLUG_LEN {
        return Err(SlugError::Length);
    }
    if !SLUG_CHARS.is_match(slug) {
        return Err(SlugError::Characters);
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(SlugError::EdgeHyphen);
    }
    if slug.contains("--") {
        return Err(SlugError::ConsecutiveHyphens);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_strips_punctuation_and_spaces() {
        assert_eq!(slugify("Joe's  Auto Spa!"), "joes-auto-spa");
        assert_eq!(slugify("  Clean & Shine -- Mobile  "), "clean-shine-mobile");
    }

    #[test]
    fn test_slugify_trims_edge_hyphens() {
        assert_eq!(slugify("Joe -"), "joe");
        assert_eq!(slugify("!!!"), "");
        let name = format!("{} x", "a".repeat(49));
        assert_eq!(slugify(&name), "a".repeat(49));
    }

    #[test]
    fn test_tenant_slug_is_always_valid() {
        let long = "word ".repeat(20);
        for name in ["!!!", "Joe -", "Al", "   ", "Joe's Auto Spa", long.as_str()] {
            let slug = tenant_slug(name);
            assert_eq!(validate_slug(&slug), Ok(()), "{name:?} -> {slug:?}");
        }
        assert_eq!(tenant_slug("!!!"), "tenant");
        assert_eq!(tenant_slug("Al"), "al-tenant");
    }

    #[test]
    fn test_slugify_truncates() {
        let long = "a".repeat(80);
        assert_eq!(slugify(&long).len(), MAX_SLUG_LEN);
    }

    #[test]
    fn test_with_suffix() {
        assert_eq!(with_suffix("jps", 0), "jps");
        assert_eq!(with_suffix("jps", 2), "jps-2");

        let long = format!("{}-b", "a".repeat(47));
        let candidate = with_suffix(&long, 12);
        assert_eq!(candidate.len(), MAX_SLUG_LEN);
        assert_eq!(validate_slug(&candidate), Ok(()));
        assert_eq!(with_suffix(&"a".repeat(50), 999), format!("{}-999", "a".repeat(46)));
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("jps-detailing").is_ok());
        assert_eq!(validate_slug("ab"), Err(SlugError::Length));
        assert_eq!(validate_slug("Bad_Slug"), Err(SlugError::Characters));
        assert_eq!(validate_slug("-jps"), Err(SlugError::EdgeHyphen));
        assert_eq!(validate_slug("jps--x"), Err(SlugError::ConsecutiveHyphens));
    }
}
