//! Slug generation with Cyrillic transliteration
//!
//! `slugify("Новый заголовок") == "novyij-zagolovok"`

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Lowercase Cyrillic letters and their Latin spelling.
/// Hard and soft signs have no spelling and vanish.
static TRANSLIT: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ('а', "a"),
        ('б', "b"),
        ('в', "v"),
        ('г', "g"),
        ('д', "d"),
        ('е', "e"),
        ('ё', "yo"),
        ('ж', "zh"),
        ('з', "z"),
        ('и', "i"),
        ('й', "j"),
        ('к', "k"),
        ('л', "l"),
        ('м', "m"),
        ('н', "n"),
        ('о', "o"),
        ('п', "p"),
        ('р', "r"),
        ('с', "s"),
        ('т', "t"),
        ('у', "u"),
        ('ф', "f"),
        ('х', "h"),
        ('ц', "ts"),
        ('ч', "ch"),
        ('ш', "sh"),
        ('щ', "sch"),
        ('ъ', ""),
        ('ы', "yi"),
        ('ь', ""),
        ('э', "e"),
        ('ю', "yu"),
        ('я', "ya"),
        // Ukrainian
        ('є', "ye"),
        ('і', "i"),
        ('ї', "yi"),
        ('ґ', "g"),
    ])
});

static AMPERSAND: Lazy<Regex> = Lazy::new(|| Regex::new(r"&amp;|&").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));
static SLUG_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid regex"));

/// Turn free text into a URL-safe slug.
///
/// Lowercases, spells `&` as `and`, joins words with single hyphens, drops
/// anything that is not ASCII alphanumeric, `-`, `_` or Cyrillic, then
/// transliterates. Leading and trailing hyphens are kept.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let spelled = AMPERSAND.replace_all(&lowered, " and ");
    let hyphenated = SEPARATORS.replace_all(&spelled, "-");

    let mut slug = String::with_capacity(hyphenated.len());
    for c in hyphenated.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
            slug.push(c);
        } else if let Some(latin) = TRANSLIT.get(&c) {
            slug.push_str(latin);
        }
    }
    slug
}

/// Cut a slug to at most `max_len` characters
pub fn truncate_slug(slug: &str, max_len: usize) -> String {
    slug.chars().take(max_len).collect()
}

/// Whether `slug` only uses Latin letters, digits, `-` and `_`
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_SHAPE.is_match(slug)
}
