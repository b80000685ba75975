pub mod handlers;

/// Derives a URL slug from a company name: lowercase ASCII alphanumerics,
/// with every run of other characters collapsed to a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Picks the first free slug among `base`, `base-2`, `base-3`, ...
pub fn next_free_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Acme Corp"), "acme-corp");
    }

    #[test]
    fn test_slugify_collapses_and_trims() {
        assert_eq!(slugify("  --Acme & Sons,  B.V.-- "), "acme-sons-b-v");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("Café Zürich"), "caf-z-rich");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_next_free_slug() {
        let taken = vec!["acme".to_string(), "acme-2".to_string()];
        assert_eq!(next_free_slug("acme", &taken), "acme-3");
        assert_eq!(next_free_slug("globex", &taken), "globex");
    }

    #[test]
    fn test_next_free_slug_after_lost_race() {
        // A slug that collided on insert is added to `taken` before retrying.
        let mut taken = vec!["acme".to_string()];
        let first = next_free_slug("acme", &taken);
        assert_eq!(first, "acme-2");
        taken.push(first);
        assert_eq!(next_free_slug("acme", &taken), "acme-3");
    }
}
