//! Country display name to geometas URL path segment.
//!
//! The generic path strips any parenthesized qualifier, lowercases, transliterates to ASCII,
//! drops `& · . ,` and joins words with `_`. Names where that does not match the site's own
//! URLs live in [`OVERRIDES`], keyed on the lowercased display form.

use deunicode::deunicode_char;
use unicode_normalization::UnicodeNormalization;

/// Slugs the site uses that the generic transliteration would not produce.
pub const OVERRIDES: &[(&str, &str)] = &[
    ("curaçao", "curaao"),
    ("réunion", "runion"),
    ("u.s. virgin islands", "us_virgin_islands"),
    ("u.s. minor outlying islands", "us_minor_outlying_islands"),
];

pub fn slugify(country: &str) -> String {
    let composed: String = country.nfc().collect();
    let key = strip_parenthesized(&composed).trim().to_lowercase();

    if let Some((_, slug)) = OVERRIDES.iter().find(|(name, _)| *name == key) {
        return slug.to_string();
    }

    join_words(&transliterate(&key))
}

/// Removes every `(...)` group along with the whitespace right before it. An unclosed `(`
/// is left alone.
fn strip_parenthesized(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('(') {
        match rest[open..].find(')') {
            Some(close) => {
                out.push_str(rest[..open].trim_end());
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

/// ASCII transliteration of every non-ASCII character except `·`, which the next step drops.
/// Characters without a transliteration disappear.
fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            c if c.is_ascii() || c == '·' => out.push(c),
            c => out.push_str(&deunicode_char(c).unwrap_or("").to_lowercase()),
        }
    }
    out.trim().to_string()
}

/// Drops `& · . ,`, turns each run of whitespace and `-` into one `_` and drops apostrophes.
/// An apostrophe still splits a run: `"a -' b"` becomes `"a__b"`.
fn join_words(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_separator = false;
    for c in s.chars() {
        match c {
            '&' | '·' | '.' | ',' => {}
            '\'' => in_separator = false,
            c if c.is_whitespace() || c == '-' => {
                if !in_separator {
                    out.push('_');
                    in_separator = true;
                }
            }
            c => {
                out.push(c);
                in_separator = false;
            }
        }
    }
    out
}
