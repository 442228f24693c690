//! Text normalisation for right-to-left documents.
//!
//! PDF text layers store glyphs in visual order. For Arabic and Persian
//! documents that means a run of digits such as a date `۱۴۰۲/۰۵/۱۲` comes
//! out of the extraction library mirrored, while the surrounding letters are
//! already in logical order. Reversing every maximal digit run restores the
//! reading order without touching anything else.
//!
//! Two passes, in this order:
//! 1. reverse each maximal run of Arabic-Indic digits, Persian digits and `/`
//! 2. optionally map those digits to Latin `0`–`9`
//!
//! Both passes are pure `&str → String` functions with no shared mutable
//! state, so page workers call them concurrently without synchronisation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Arabic-Indic digits U+0660–U+0669, Persian digits U+06F0–U+06F9, and `/`.
static RE_DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x{0660}-\x{0669}\x{06F0}-\x{06F9}/]+").unwrap());

/// Normalise one page of extracted text.
///
/// ```rust
/// use edgequake_pdf_extract::normalize;
///
/// assert_eq!(normalize("١٢٣", false), "٣٢١");
/// assert_eq!(normalize("١٢٣", true), "321");
/// assert_eq!(normalize("abc", true), "abc");
/// ```
pub fn normalize(text: &str, english_numbering: bool) -> String {
    let reordered = reverse_digit_runs(text);
    if english_numbering {
        digits_to_latin(&reordered)
    } else {
        reordered.into_owned()
    }
}

/// Reverse every maximal digit run; other characters are left in place.
pub fn reverse_digit_runs(text: &str) -> Cow<'_, str> {
    RE_DIGIT_RUN.replace_all(text, |caps: &regex::Captures<'_>| {
        caps[0].chars().rev().collect::<String>()
    })
}

/// Map Arabic-Indic and Persian digits to Latin digits by ordinal position.
pub fn digits_to_latin(text: &str) -> String {
    text.chars().map(latin_digit).collect()
}

fn latin_digit(c: char) -> char {
    let offset = match c {
        '\u{0660}'..='\u{0669}' => c as u32 - 0x0660,
        '\u{06F0}'..='\u{06F9}' => c as u32 - 0x06F0,
        _ => return c,
    };
    char::from_digit(offset, 10).unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reverses_arabic_indic_run() {
        assert_eq!(normalize("١٢٣", false), "٣٢١");
    }

    #[test]
    fn reverses_then_transliterates() {
        assert_eq!(normalize("١٢٣", true), "321");
    }

    #[test]
    fn latin_text_is_untouched() {
        assert_eq!(normalize("abc", true), "abc");
        assert_eq!(normalize("abc 123", false), "abc 123");
    }

    #[test]
    fn persian_date_keeps_separators_in_run() {
        // Visual order "۱۲/۰۵/۱۴۰۲" is read back as "۲۰۴۱/۵۰/۲۱".
        let visual = "تاریخ ۱۲/۰۵/۱۴۰۲";
        assert_eq!(normalize(visual, false), "تاریخ ۲۰۴۱/۵۰/۲۱");
        assert_eq!(normalize(visual, true), "تاریخ 2041/50/21");
    }

    #[test]
    fn surrounding_letters_stay_in_place() {
        let text = "صفحه ٤٥ از ١٠٠";
        assert_eq!(normalize(text, false), "صفحه ٥٤ از ٠٠١");
    }

    #[test]
    fn mixed_scripts_in_one_run() {
        // Arabic-Indic and Persian digits belong to the same run.
        assert_eq!(normalize("١۲", false), "۲١");
        assert_eq!(normalize("١۲", true), "21");
    }

    #[test]
    fn transliteration_preserves_char_count() {
        let text = "۰۱۲۳۴۵۶۷۸۹٠١٢٣٤٥٦٧٨٩";
        let out = digits_to_latin(text);
        assert_eq!(out, "01234567890123456789");
        assert_eq!(out.chars().count(), text.chars().count());
    }

    #[test]
    fn idempotent_with_english_numbering() {
        for s in ["١٢٣", "تاریخ ۱۲/۰۵/۱۴۰۲", "a/b//c", "plain", "", "٣ و ۴"] {
            let once = normalize(s, true);
            assert_eq!(normalize(&once, true), once, "input: {s:?}");
        }
    }

    #[test]
    fn no_match_borrows_input() {
        assert!(matches!(reverse_digit_runs("hello"), Cow::Borrowed(_)));
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize("", true), "");
    }
}
