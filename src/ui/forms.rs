use std::mem;

use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::Verse;

/// Focusable positions within the verse form. The list-valued fields carry
/// the index of the slot they refer to, so focus survives slots being added
/// or removed around it.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum FormField {
    Number(usize),
    VerseText,
    Translation,
    Link,
    Insight(usize),
    NewInsight,
}

/// Draft of one verse record being added or edited. The draft keeps raw
/// strings for every field plus a staging slot for an insight that has been
/// typed but not yet committed to the list; submission merges it.
pub(crate) struct VerseForm {
    pub(crate) id: Option<i64>,
    pub(crate) numbers: Vec<String>,
    pub(crate) verse: String,
    pub(crate) translation: String,
    pub(crate) link: String,
    pub(crate) insights: Vec<String>,
    pub(crate) new_insight: String,
    pub(crate) active: FormField,
    pub(crate) error: Option<String>,
}

impl Default for VerseForm {
    fn default() -> Self {
        Self {
            id: None,
            numbers: vec![String::new()],
            verse: String::new(),
            translation: String::new(),
            link: String::new(),
            insights: Vec::new(),
            new_insight: String::new(),
            active: FormField::Number(0),
            error: None,
        }
    }
}

impl VerseForm {
    /// Populate the form from an existing record when entering edit mode.
    pub(crate) fn from_verse(verse: &Verse) -> Self {
        let numbers = if verse.numbers.is_empty() {
            vec![String::new()]
        } else {
            verse.numbers.clone()
        };
        Self {
            id: verse.id,
            numbers,
            verse: verse.verse.clone(),
            translation: verse.translation.clone(),
            link: verse.link.clone().unwrap_or_default(),
            insights: verse.insights.clone(),
            new_insight: String::new(),
            active: FormField::Number(0),
            error: None,
        }
    }

    /// Every focusable field in visual order, reflecting the current slot
    /// counts. Focus cycling walks this list.
    fn field_order(&self) -> Vec<FormField> {
        let mut order: Vec<FormField> = (0..self.numbers.len()).map(FormField::Number).collect();
        order.push(FormField::VerseText);
        order.push(FormField::Translation);
        order.push(FormField::Link);
        order.extend((0..self.insights.len()).map(FormField::Insight));
        order.push(FormField::NewInsight);
        order
    }

    /// Move focus forward, wrapping at the end.
    pub(crate) fn next_field(&mut self) {
        self.cycle_field(1);
    }

    /// Move focus backward, wrapping at the start.
    pub(crate) fn previous_field(&mut self) {
        self.cycle_field(-1);
    }

    fn cycle_field(&mut self, step: isize) {
        let order = self.field_order();
        let position = order
            .iter()
            .position(|field| *field == self.active)
            .unwrap_or(0) as isize;
        let len = order.len() as isize;
        let next = (position + step).rem_euclid(len);
        self.active = order[next as usize];
    }

    fn active_value_mut(&mut self) -> &mut String {
        match self.active {
            FormField::Number(i) => &mut self.numbers[i],
            FormField::VerseText => &mut self.verse,
            FormField::Translation => &mut self.translation,
            FormField::Link => &mut self.link,
            FormField::Insight(i) => &mut self.insights[i],
            FormField::NewInsight => &mut self.new_insight,
        }
    }

    /// Append a printable character to the active field.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.active_value_mut().push(ch);
        true
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        self.active_value_mut().pop();
    }

    /// Insert a line break. Only the two long-text fields are multi-line.
    pub(crate) fn insert_newline(&mut self) -> bool {
        match self.active {
            FormField::VerseText | FormField::Translation => {
                self.active_value_mut().push('\n');
                true
            }
            _ => false,
        }
    }

    /// Commit the staged insight to the list, clearing the staging slot.
    /// Blank staging text is ignored.
    pub(crate) fn commit_insight(&mut self) -> bool {
        if self.new_insight.trim().is_empty() {
            return false;
        }
        let staged = mem::take(&mut self.new_insight);
        self.insights.push(staged);
        true
    }

    /// Add an empty citation slot and focus it.
    pub(crate) fn add_number_slot(&mut self) {
        self.numbers.push(String::new());
        self.active = FormField::Number(self.numbers.len() - 1);
    }

    /// Remove the active slot. The last remaining citation slot is cleared
    /// instead of removed so the form always has somewhere to type the
    /// required first citation.
    pub(crate) fn remove_active_slot(&mut self) {
        match self.active {
            FormField::Number(i) => {
                if self.numbers.len() > 1 {
                    self.numbers.remove(i);
                    self.active = FormField::Number(i.min(self.numbers.len() - 1));
                } else {
                    self.numbers[0].clear();
                }
            }
            FormField::Insight(i) => {
                self.insights.remove(i);
                self.active = if self.insights.is_empty() {
                    FormField::NewInsight
                } else {
                    FormField::Insight(i.min(self.insights.len() - 1))
                };
            }
            FormField::NewInsight => self.new_insight.clear(),
            _ => {}
        }
    }

    /// Validate the draft and produce a record ready for the store. Any
    /// staged insight is merged first, then empty citation and insight
    /// entries are stripped. The normalized cache is left empty on purpose:
    /// the store write path recomputes it from the final text.
    pub(crate) fn parse_inputs(&self) -> Result<Verse> {
        let mut insights: Vec<String> = self
            .insights
            .iter()
            .map(|insight| insight.trim().to_string())
            .filter(|insight| !insight.is_empty())
            .collect();
        let staged = self.new_insight.trim();
        if !staged.is_empty() {
            insights.push(staged.to_string());
        }

        let numbers: Vec<String> = self
            .numbers
            .iter()
            .map(|number| number.trim().to_string())
            .filter(|number| !number.is_empty())
            .collect();
        if numbers.is_empty() {
            return Err(anyhow!("At least one citation number is required."));
        }

        let verse = self.verse.trim();
        if verse.is_empty() {
            return Err(anyhow!("Verse text is required."));
        }
        let translation = self.translation.trim();
        if translation.is_empty() {
            return Err(anyhow!("Translation is required."));
        }

        let link = self.link.trim();
        Ok(Verse {
            id: self.id,
            numbers,
            link: (!link.is_empty()).then(|| link.to_string()),
            verse: verse.to_string(),
            normalized_verse: None,
            translation: translation.to_string(),
            insights,
        })
    }

    /// Render the form body, returning the lines plus the cursor position
    /// (relative to the paragraph origin) for the active field.
    pub(crate) fn build_lines(&self) -> (Vec<Line<'static>>, (u16, u16)) {
        let mut lines = Vec::new();
        let mut cursor = (0u16, 0u16);

        for (i, value) in self.numbers.iter().enumerate() {
            let label = format!("Number {}: ", i + 1);
            let placeholder = if i == 0 { "<required>" } else { "<optional>" };
            self.push_single_line(
                &mut lines,
                &mut cursor,
                label,
                value,
                FormField::Number(i),
                placeholder,
            );
        }

        self.push_multi_line(&mut lines, &mut cursor, "Verse", &self.verse, FormField::VerseText);
        self.push_multi_line(
            &mut lines,
            &mut cursor,
            "Translation",
            &self.translation,
            FormField::Translation,
        );
        self.push_single_line(
            &mut lines,
            &mut cursor,
            "Link: ".to_string(),
            &self.link,
            FormField::Link,
            "<optional>",
        );

        for (i, value) in self.insights.iter().enumerate() {
            let label = format!("Insight {}: ", i + 1);
            self.push_single_line(
                &mut lines,
                &mut cursor,
                label,
                value,
                FormField::Insight(i),
                "<optional>",
            );
        }
        self.push_single_line(
            &mut lines,
            &mut cursor,
            "New insight: ".to_string(),
            &self.new_insight,
            FormField::NewInsight,
            "<optional>",
        );

        (lines, cursor)
    }

    fn push_single_line(
        &self,
        lines: &mut Vec<Line<'static>>,
        cursor: &mut (u16, u16),
        label: String,
        value: &str,
        field: FormField,
        placeholder: &str,
    ) {
        let is_active = self.active == field;
        let display = if value.is_empty() {
            placeholder.to_string()
        } else {
            value.to_string()
        };
        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        if is_active {
            *cursor = (
                (label.chars().count() + value.chars().count()) as u16,
                lines.len() as u16,
            );
        }
        lines.push(Line::from(vec![Span::raw(label), Span::styled(display, style)]));
    }

    fn push_multi_line(
        &self,
        lines: &mut Vec<Line<'static>>,
        cursor: &mut (u16, u16),
        label: &str,
        value: &str,
        field: FormField,
    ) {
        let is_active = self.active == field;
        let header_style = if is_active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(format!("{label}:"), header_style)));

        if value.is_empty() {
            if is_active {
                *cursor = (2, lines.len() as u16);
            }
            lines.push(Line::from(Span::styled(
                "  <required>",
                Style::default().fg(Color::DarkGray),
            )));
            return;
        }

        let body_style = if is_active {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        for part in value.split('\n') {
            if is_active {
                *cursor = ((2 + part.chars().count()) as u16, lines.len() as u16);
            }
            lines.push(Line::from(Span::styled(format!("  {part}"), body_style)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> VerseForm {
        let mut form = VerseForm::default();
        form.numbers[0] = "BG 2.7".to_string();
        form.verse = "kārpaṇya-doṣopahata\nsvabhāvaḥ".to_string();
        form.translation = "Now I am confused about my duty".to_string();
        form
    }

    #[test]
    fn parse_requires_first_citation_verse_and_translation() {
        let empty = VerseForm::default();
        assert!(empty.parse_inputs().is_err());

        let mut missing_translation = filled_form();
        missing_translation.translation = "   ".to_string();
        assert!(missing_translation.parse_inputs().is_err());

        let mut whitespace_number = filled_form();
        whitespace_number.numbers[0] = "  ".to_string();
        assert!(whitespace_number.parse_inputs().is_err());

        assert!(filled_form().parse_inputs().is_ok());
    }

    #[test]
    fn parse_strips_empty_slots_and_merges_staged_insight() {
        let mut form = filled_form();
        form.numbers.push(String::new());
        form.numbers.push("Gītā 2.7".to_string());
        form.insights = vec!["first".to_string(), "   ".to_string()];
        form.new_insight = " staged but uncommitted ".to_string();

        let verse = form.parse_inputs().expect("valid");
        assert_eq!(
            verse.numbers,
            vec!["BG 2.7".to_string(), "Gītā 2.7".to_string()]
        );
        assert_eq!(
            verse.insights,
            vec!["first".to_string(), "staged but uncommitted".to_string()]
        );
        // The cache is left for the store to recompute.
        assert_eq!(verse.normalized_verse, None);
    }

    #[test]
    fn parse_preserves_interior_newlines() {
        let verse = filled_form().parse_inputs().expect("valid");
        assert_eq!(verse.verse, "kārpaṇya-doṣopahata\nsvabhāvaḥ");
    }

    #[test]
    fn blank_link_becomes_none() {
        let mut form = filled_form();
        form.link = "   ".to_string();
        assert_eq!(form.parse_inputs().expect("valid").link, None);

        form.link = " https://example.org ".to_string();
        assert_eq!(
            form.parse_inputs().expect("valid").link,
            Some("https://example.org".to_string())
        );
    }

    #[test]
    fn commit_insight_moves_staged_text_into_list() {
        let mut form = filled_form();
        form.new_insight = "a note".to_string();
        assert!(form.commit_insight());
        assert_eq!(form.insights, vec!["a note".to_string()]);
        assert!(form.new_insight.is_empty());

        form.new_insight = "   ".to_string();
        assert!(!form.commit_insight());
        assert_eq!(form.insights.len(), 1);
    }

    #[test]
    fn last_citation_slot_clears_instead_of_disappearing() {
        let mut form = filled_form();
        form.active = FormField::Number(0);
        form.remove_active_slot();
        assert_eq!(form.numbers, vec![String::new()]);

        form.numbers = vec!["a".to_string(), "b".to_string()];
        form.active = FormField::Number(0);
        form.remove_active_slot();
        assert_eq!(form.numbers, vec!["b".to_string()]);
        assert_eq!(form.active, FormField::Number(0));
    }

    #[test]
    fn removing_an_insight_refocuses_sensibly() {
        let mut form = filled_form();
        form.insights = vec!["one".to_string(), "two".to_string()];
        form.active = FormField::Insight(1);
        form.remove_active_slot();
        assert_eq!(form.active, FormField::Insight(0));

        form.remove_active_slot();
        assert_eq!(form.active, FormField::NewInsight);
        assert!(form.insights.is_empty());
    }

    #[test]
    fn focus_cycles_through_every_field_and_wraps() {
        let mut form = filled_form();
        form.numbers.push("slot two".to_string());
        form.insights.push("note".to_string());

        let expected = [
            FormField::Number(0),
            FormField::Number(1),
            FormField::VerseText,
            FormField::Translation,
            FormField::Link,
            FormField::Insight(0),
            FormField::NewInsight,
        ];
        for field in expected {
            assert_eq!(form.active, field);
            form.next_field();
        }
        assert_eq!(form.active, FormField::Number(0));

        form.previous_field();
        assert_eq!(form.active, FormField::NewInsight);
    }

    #[test]
    fn newlines_only_in_long_text_fields() {
        let mut form = filled_form();
        form.active = FormField::VerseText;
        assert!(form.insert_newline());

        form.active = FormField::Number(0);
        assert!(!form.insert_newline());
        assert!(!form.numbers[0].contains('\n'));
    }

    #[test]
    fn from_verse_round_trips_through_parse() {
        let original = filled_form().parse_inputs().expect("valid");
        let reparsed = VerseForm::from_verse(&original).parse_inputs().expect("valid");
        assert_eq!(original, reparsed);
    }
}
