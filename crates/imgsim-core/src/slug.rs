//! URL-safe slugs for asset base names.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("valid non-word pattern"));
static DASH_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").expect("valid dash pattern"));

/// Slugify a file base name.
///
/// Diacritics are stripped (NFD, then combining marks dropped), the result is
/// lowercased, every run of characters outside `[A-Za-z0-9_-]` becomes one
/// dash, dash runs collapse and leading/trailing dashes are trimmed.
///
/// Total: a non-empty input never yields an empty slug. When nothing
/// word-like survives (e.g. `"日本"`), the slug is the dash-joined hex code
/// points of the input, which is itself a fixed point.
pub fn slugify(input: &str) -> String {
    let stripped: String = input.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let lowered = stripped.to_lowercase();
    let dashed = NON_WORD.replace_all(&lowered, "-");
    let collapsed = DASH_RUN.replace_all(&dashed, "-");
    let slug = collapsed.trim_matches('-');
    if !slug.is_empty() || input.is_empty() {
        return slug.to_string();
    }
    input.chars().map(|c| format!("{:x}", u32::from(c))).collect::<Vec<_>>().join("-")
}
