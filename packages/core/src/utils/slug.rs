//! Slug Generation
//!
//! Deterministic transliteration and slugification for URL path segments.
//! Unicode input is decomposed (NFKD) and combining marks are stripped, so
//! "Über Café" becomes "uber-cafe". Anything left that is not ASCII
//! alphanumeric collapses into single hyphens.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Turn an arbitrary title into a URL-safe slug.
///
/// The result is lowercase ASCII with hyphen-separated segments and no
/// leading or trailing hyphens. Returns an empty string when the input
/// contains no usable characters; callers decide the fallback.
///
/// # Examples
///
/// ```
/// use folio_core::utils::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("Über Café"), "uber-cafe");
/// assert_eq!(slugify("  --  "), "");
/// ```
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for ch in input.nfkd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_slugification() {
        assert_eq!(slugify("About Us"), "about-us");
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn test_transliteration() {
        assert_eq!(slugify("Über Café"), "uber-cafe");
        assert_eq!(slugify("Crème brûlée"), "creme-brulee");
        assert_eq!(slugify("Señor Niño"), "senor-nino");
    }

    #[test]
    fn test_collapses_separator_runs() {
        assert_eq!(slugify("a  --  b"), "a-b");
        assert_eq!(slugify("one___two...three"), "one-two-three");
    }

    #[test]
    fn test_no_leading_or_trailing_hyphens() {
        assert_eq!(slugify("  spaced out  "), "spaced-out");
        assert_eq!(slugify("---x---"), "x");
    }

    #[test]
    fn test_empty_and_unusable_input() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(slugify("Team Page 2024"), slugify("Team Page 2024"));
        assert_eq!(slugify("Team Page 2024"), "team-page-2024");
    }
}
