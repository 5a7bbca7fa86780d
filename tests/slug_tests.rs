use linkbundle::slug::{MAX_SLUG_LEN, SUFFIX_LEN, generate_admin_token, generate_slug};
use regex::Regex;
use std::collections::HashSet;

// --- Helpers ---

fn slug_pattern() -> Regex {
    Regex::new(r"^[a-z0-9-]*-[A-Za-z0-9_-]{8}$").unwrap()
}

fn is_well_formed(slug: &str) -> bool {
    slug_pattern().is_match(slug)
}

// --- Tests ---

#[test]
fn test_slug_shape_for_many_titles() {
    let titles = [
        "My Links",
        "  leading and trailing  ",
        "UPPER case",
        "symbols !@#$%^&*() everywhere",
        "émoji 🚀 and accents",
        "already-hyphenated-title",
        "multiple\t\twhitespace\n\nkinds",
        "1234567890",
        "",
    ];

    for title in titles {
        let slug = generate_slug(Some(title));
        assert!(is_well_formed(&slug), "malformed slug {:?} for {:?}", slug, title);
    }
}

#[test]
fn test_slug_is_unique_across_repeated_calls() {
    let slugs: HashSet<String> = (0..1000).map(|_| generate_slug(Some("Same Title"))).collect();
    assert_eq!(slugs.len(), 1000, "slug collision in 1000 generations");
}

#[test]
fn test_slug_prefix_follows_title() {
    let slug = generate_slug(Some("My Links"));
    assert!(slug.starts_with("my-links-"), "got {}", slug);
    assert_eq!(slug.len(), "my-links-".len() + SUFFIX_LEN);
}

#[test]
fn test_empty_or_missing_title_yields_only_suffix() {
    for slug in [generate_slug(None), generate_slug(Some("")), generate_slug(Some("   "))] {
        assert_eq!(slug.len(), SUFFIX_LEN + 1);
        assert!(slug.starts_with('-'));
        assert!(is_well_formed(&slug));
    }
}

#[test]
fn test_long_titles_fit_the_slug_column() {
    let title = "word ".repeat(100);
    let slug = generate_slug(Some(&title));
    assert!(slug.len() <= MAX_SLUG_LEN);
    assert!(is_well_formed(&slug));
}

#[test]
fn test_admin_tokens_are_unique() {
    let tokens: HashSet<_> = (0..1000).map(|_| generate_admin_token()).collect();
    assert_eq!(tokens.len(), 1000);

    let token = generate_admin_token().to_string();
    assert_eq!(token.len(), 36);
}
