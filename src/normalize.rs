//! Canonical text normalization used for diacritic-insensitive search. The
//! transliteration schemes used for verse text (IAST and friends) lean heavily
//! on combining marks, so matching raw input against raw verse text almost
//! never works. Normalizing both sides to a stripped, whitespace-collapsed
//! lowercase form makes substring search behave the way a reader expects.

use unicode_normalization::UnicodeNormalization;

/// Map display text to its search-canonical form: lowercase, NFD-decompose,
/// drop the combining diacritical marks block (U+0300–U+036F), and collapse
/// every run of hyphens/dashes and whitespace into a single space with no
/// leading or trailing space.
///
/// The function is pure and total; applying it twice yields the same string
/// as applying it once.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_gap = false;

    for ch in lowered.nfd() {
        if matches!(ch, '\u{0300}'..='\u{036f}') {
            continue;
        }
        if ch.is_whitespace() || matches!(ch, '-' | '\u{2010}'..='\u{2015}') {
            pending_gap = true;
            continue;
        }
        if pending_gap && !out.is_empty() {
            out.push(' ');
        }
        pending_gap = false;
        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn lowercases_input() {
        assert_eq!(normalize("DHARMA"), "dharma");
    }

    #[test]
    fn strips_combining_diacritics() {
        // a + combining acute equals a plain a.
        assert_eq!(normalize("a\u{0301}"), normalize("a"));
        // Precomposed characters decompose first, then lose their marks.
        assert_eq!(normalize("kṛṣṇa"), "krsna");
    }

    #[test]
    fn precomposed_and_decomposed_agree() {
        assert_eq!(normalize("é"), normalize("e\u{0301}"));
        assert_eq!(normalize("é"), "e");
    }

    #[test]
    fn collapses_dashes_and_spaces() {
        assert_eq!(normalize("foo -  bar"), "foo bar");
        assert_eq!(normalize("kārpaṇya-doṣopahata"), "karpanya dosopahata");
        assert_eq!(normalize("a\u{2014}b"), "a b");
    }

    #[test]
    fn trims_ends() {
        assert_eq!(normalize("  om  "), "om");
        assert_eq!(normalize("- om -"), "om");
    }

    #[test]
    fn empty_and_separator_only_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" -- \t "), "");
    }

    #[test]
    fn idempotent() {
        for sample in [
            "Kārpaṇya-doṣopahata-svabhāvaḥ",
            "foo -  bar",
            "  MIXED Case\nlines  ",
            "",
            "already normal",
        ] {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn newlines_become_single_spaces() {
        assert_eq!(normalize("line one\nline two"), "line one line two");
    }
}
