//! Canonicalization of name-like search terms.
//!
//! Equivalent spellings of a name (case, compatibility characters, stray
//! whitespace) must produce the same blind index, so names are normalized
//! before hashing. Identifiers are never passed through here.

use unicode_normalization::UnicodeNormalization;

/// Normalizes a name-like value into its canonical form.
///
/// Steps, in order:
/// 1. lowercase
/// 2. Unicode NFKC
/// 3. lowercase again (NFKC can produce uppercase letters, e.g. `ℌ` → `H`)
/// 4. trim and collapse every run of whitespace to a single ASCII space;
///    the information separators U+001C..=U+001F count as whitespace
///
/// The function is total and idempotent.
///
/// # Example
///
/// ```
/// use blindvault::normalize::normalize;
///
/// assert_eq!(normalize("  JOHN   Doe"), "john doe");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    let folded: String = raw.to_lowercase().nfkc().collect::<String>().to_lowercase();
    folded.split(is_separator).filter(|word| !word.is_empty()).collect::<Vec<_>>().join(" ")
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}
