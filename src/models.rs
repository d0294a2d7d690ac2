//! The domain model shared by the persistence layer and the TUI. There is a
//! single entity: a verse record with its citation labels, source text,
//! translation, and optional commentary. The serde attributes pin the wire
//! field names (camelCase, matching the YAML document format and the table
//! columns) so both backends serialize identically.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// One verse record. Field order matters: serde serializes in declaration
/// order and the YAML documents are easier to read (and diff) when `verse`
/// sits next to `normalizedVerse`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verse {
    /// Backend-assigned identifier. `None` only for records that have never
    /// been written through this crate (legacy documents); the startup
    /// backfill assigns ids so updates can address records stably instead of
    /// relying on list position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Citation labels, e.g. "BG 2.7". At least one non-empty entry is
    /// required before persistence; the first one is the primary display key.
    pub numbers: Vec<String>,
    /// Optional URL to an external source for the verse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Raw display text. May contain diacritics and span multiple lines.
    pub verse: String,
    /// Cached `normalize(verse)`. Absent until computed; the store write path
    /// and the explicit backfill both fill it in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_verse: Option<String>,
    /// Required translation text.
    pub translation: String,
    /// Free-text commentary entries; may be empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insights: Vec<String>,
}

impl Verse {
    /// The primary citation label, used as the record's display title.
    pub fn primary_number(&self) -> &str {
        self.numbers.first().map(String::as_str).unwrap_or("")
    }

    /// All citation labels joined for headers and palette rows.
    pub fn display_numbers(&self) -> String {
        self.numbers.join(", ")
    }

    /// Compute and cache the normalized form when it is missing and there is
    /// verse text to normalize. Returns whether the record changed, so bulk
    /// callers (the document backfill) know whether a rewrite is needed.
    pub fn ensure_normalized(&mut self) -> bool {
        let missing = self
            .normalized_verse
            .as_ref()
            .map_or(true, |cached| cached.is_empty());
        if missing && !self.verse.is_empty() {
            self.normalized_verse = Some(normalize(&self.verse));
            true
        } else {
            false
        }
    }

    /// Case-insensitive substring match against every searchable field:
    /// each citation label, the raw verse text, the translation, and the
    /// normalized verse cache. `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.numbers
            .iter()
            .any(|number| number.to_lowercase().contains(needle))
            || self.verse.to_lowercase().contains(needle)
            || self.translation.to_lowercase().contains(needle)
            || self
                .normalized_verse
                .as_deref()
                .is_some_and(|cached| cached.contains(needle))
    }

    /// The link with surrounding whitespace trimmed, or `None` when the field
    /// is absent or blank. Keeps "has a link" checks consistent between the
    /// display screen and the open-link action.
    pub fn trimmed_link(&self) -> Option<&str> {
        self.link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Verse {
        Verse {
            id: Some(3),
            numbers: vec!["BG 2.7".to_string(), "Gītā 2.7".to_string()],
            link: Some("https://example.org/bg/2/7".to_string()),
            verse: "kārpaṇya-doṣopahata-svabhāvaḥ".to_string(),
            normalized_verse: Some("karpanya dosopahata svabhavah".to_string()),
            translation: "Now I am confused about my duty".to_string(),
            insights: vec!["Arjuna surrenders as a disciple".to_string()],
        }
    }

    #[test]
    fn matches_against_every_field() {
        let verse = sample();
        assert!(verse.matches_query("bg 2.7"));
        assert!(verse.matches_query("gītā"));
        assert!(verse.matches_query("kārpaṇya"));
        assert!(verse.matches_query("confused about"));
        // Diacritic-free input hits the normalized cache.
        assert!(verse.matches_query("dosopahata"));
        assert!(!verse.matches_query("unrelated"));
    }

    #[test]
    fn ensure_normalized_fills_only_when_missing() {
        let mut verse = sample();
        assert!(!verse.ensure_normalized());

        verse.normalized_verse = None;
        assert!(verse.ensure_normalized());
        assert_eq!(
            verse.normalized_verse.as_deref(),
            Some("karpanya dosopahata svabhavah")
        );

        verse.normalized_verse = Some(String::new());
        assert!(verse.ensure_normalized());
        assert_eq!(
            verse.normalized_verse.as_deref(),
            Some("karpanya dosopahata svabhavah")
        );
    }

    #[test]
    fn ensure_normalized_skips_empty_verse() {
        let mut verse = sample();
        verse.verse = String::new();
        verse.normalized_verse = None;
        assert!(!verse.ensure_normalized());
        assert!(verse.normalized_verse.is_none());
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let doc = serde_yaml::to_string(&vec![sample()]).expect("serialize");
        assert!(doc.contains("normalizedVerse:"));
        assert!(doc.contains("numbers:"));
        assert!(doc.contains("insights:"));
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let doc = "- numbers:\n    - \"BG 18.66\"\n  verse: sarva-dharmān\n  translation: Abandon all varieties of religion\n";
        let verses: Vec<Verse> = serde_yaml::from_str(doc).expect("parse");
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].id, None);
        assert_eq!(verses[0].link, None);
        assert_eq!(verses[0].normalized_verse, None);
        assert!(verses[0].insights.is_empty());
    }

    #[test]
    fn trimmed_link_filters_blank_values() {
        let mut verse = sample();
        assert_eq!(verse.trimmed_link(), Some("https://example.org/bg/2/7"));
        verse.link = Some("   ".to_string());
        assert_eq!(verse.trimmed_link(), None);
        verse.link = None;
        assert_eq!(verse.trimmed_link(), None);
    }
}
