use std::cmp::min;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::models::Verse;
use crate::session::CursorSlot;
use crate::store::VerseStore;

use super::forms::{FormField, VerseForm};
use super::helpers::{centered_rect, surface_error, truncate_preview};
use super::palette::PaletteState;

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Character budget for the translation preview in palette rows.
const PREVIEW_WIDTH: usize = 60;

/// Interaction modes layered over the single verse view. Keeping this
/// explicit makes it easy to reason about which keyboard shortcuts are live:
/// navigation keys only act in `Normal`, and the palette is unreachable while
/// a form is open.
enum Mode {
    Normal,
    Palette(PaletteState),
    AddingVerse(VerseForm),
    EditingVerse { index: usize, form: VerseForm },
}

/// Whether a form submission creates a record or replaces the one at a
/// position in the loaded list.
#[derive(Copy, Clone)]
enum FormTarget {
    Add,
    Edit(usize),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state: the loaded verse list, the navigation cursor
/// into it, the persistence backend, and the durable last-viewed slot.
pub struct App {
    store: Box<dyn VerseStore>,
    verses: Vec<Verse>,
    selected: usize,
    cursor_slot: Box<dyn CursorSlot>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    /// Build the app around an already-loaded collection. The persisted
    /// cursor is read exactly once here; a stored value only wins when it is
    /// within the current bounds, otherwise the cursor starts at 0.
    pub fn new(
        store: Box<dyn VerseStore>,
        verses: Vec<Verse>,
        cursor_slot: Box<dyn CursorSlot>,
    ) -> Self {
        let selected = cursor_slot
            .read()
            .filter(|&index| index < verses.len())
            .unwrap_or(0);
        Self {
            store,
            verses,
            selected,
            cursor_slot,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Show an informational footer message. Used by the bootstrap code to
    /// report startup work such as the backfill count.
    pub fn flash_info<S: Into<String>>(&mut self, text: S) {
        self.set_status(text, StatusKind::Info);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Palette(state) => self.handle_palette_key(code, state),
            Mode::AddingVerse(form) => self.handle_form_key(code, FormTarget::Add, form),
            Mode::EditingVerse { index, form } => {
                self.handle_form_key(code, FormTarget::Edit(index), form)
            }
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Left | KeyCode::Up => self.previous_verse(),
            KeyCode::Right | KeyCode::Down => self.next_verse(),
            KeyCode::Home => self.select_index(0),
            KeyCode::End => {
                if !self.verses.is_empty() {
                    self.select_index(self.verses.len() - 1);
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                return Mode::Palette(PaletteState::new(&self.verses));
            }
            KeyCode::Char('+') | KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return Mode::AddingVerse(VerseForm::default());
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(verse) = self.current_verse() {
                    let form = VerseForm::from_verse(verse);
                    self.clear_status();
                    return Mode::EditingVerse {
                        index: self.selected,
                        form,
                    };
                }
                self.set_status("No verse selected to edit.", StatusKind::Error);
            }
            KeyCode::Enter | KeyCode::Char('o') | KeyCode::Char('O') => {
                self.open_current_link();
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_palette_key(&mut self, code: KeyCode, mut state: PaletteState) -> Mode {
        match code {
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Up => state.move_selection(-1),
            KeyCode::Down => state.move_selection(1),
            KeyCode::PageUp => state.move_selection(-5),
            KeyCode::PageDown => state.move_selection(5),
            KeyCode::Home => state.select_first(),
            KeyCode::End => state.select_last(),
            KeyCode::Enter => {
                if let Some(index) = state.current_verse_index() {
                    self.select_index(index);
                    let label = self
                        .current_verse()
                        .map(Verse::display_numbers)
                        .unwrap_or_default();
                    self.set_status(format!("Jumped to {label}."), StatusKind::Info);
                    return Mode::Normal;
                }
                return Mode::Palette(state);
            }
            KeyCode::Backspace => state.backspace(&self.verses),
            KeyCode::Char(ch) => state.push_char(&self.verses, ch),
            _ => {}
        }
        Mode::Palette(state)
    }

    fn handle_form_key(&mut self, code: KeyCode, target: FormTarget, mut form: VerseForm) -> Mode {
        match code {
            KeyCode::Esc => {
                let message = match target {
                    FormTarget::Add => "Add verse cancelled.",
                    FormTarget::Edit(_) => "Edit cancelled.",
                };
                self.set_status(message, StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab => form.next_field(),
            KeyCode::BackTab => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                if form.active == FormField::NewInsight {
                    form.commit_insight();
                } else if !form.insert_newline() {
                    // Single-line fields treat Enter as "move on".
                    form.next_field();
                }
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }
        Self::form_mode(target, form)
    }

    fn form_mode(target: FormTarget, form: VerseForm) -> Mode {
        match target {
            FormTarget::Add => Mode::AddingVerse(form),
            FormTarget::Edit(index) => Mode::EditingVerse { index, form },
        }
    }

    /// Toggle the command palette. No-op while a form is open so stray
    /// shortcuts cannot discard a draft.
    pub(crate) fn handle_ctrl_k(&mut self) {
        let mode = mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::Normal => {
                self.clear_status();
                Mode::Palette(PaletteState::new(&self.verses))
            }
            Mode::Palette(_) => Mode::Normal,
            form_mode => form_mode,
        };
    }

    /// Save the open form. Validation and store failures land in the form's
    /// error line and keep it open; nothing fails silently.
    pub(crate) fn handle_ctrl_s(&mut self) {
        let mode = mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::AddingVerse(mut form) => match self.save_new_verse(&form) {
                Ok(()) => Mode::Normal,
                Err(message) => {
                    form.error = Some(message);
                    Mode::AddingVerse(form)
                }
            },
            Mode::EditingVerse { index, mut form } => {
                match self.save_existing_verse(index, &form) {
                    Ok(()) => Mode::Normal,
                    Err(message) => {
                        form.error = Some(message);
                        Mode::EditingVerse { index, form }
                    }
                }
            }
            other => other,
        };
    }

    /// Add a citation slot to the open form.
    pub(crate) fn handle_ctrl_n(&mut self) {
        if let Mode::AddingVerse(form) | Mode::EditingVerse { form, .. } = &mut self.mode {
            form.add_number_slot();
        }
    }

    /// Remove the active slot from the open form.
    pub(crate) fn handle_ctrl_d(&mut self) {
        if let Mode::AddingVerse(form) | Mode::EditingVerse { form, .. } = &mut self.mode {
            form.remove_active_slot();
        }
    }

    fn save_new_verse(&mut self, form: &VerseForm) -> Result<(), String> {
        let candidate = form.parse_inputs().map_err(|err| surface_error(&err))?;
        let created = self
            .store
            .create(candidate)
            .map_err(|err| surface_error(&anyhow::Error::from(err)))?;

        let label = created.primary_number().to_string();
        self.verses.push(created);
        self.select_index(self.verses.len() - 1);
        self.set_status(format!("Added {label}."), StatusKind::Info);
        Ok(())
    }

    fn save_existing_verse(&mut self, index: usize, form: &VerseForm) -> Result<(), String> {
        let candidate = form.parse_inputs().map_err(|err| surface_error(&err))?;
        let updated = self
            .store
            .update(candidate)
            .map_err(|err| surface_error(&anyhow::Error::from(err)))?;

        let label = updated.primary_number().to_string();
        if let Some(slot) = self.verses.get_mut(index) {
            *slot = updated;
        }
        self.set_status(format!("Updated {label}."), StatusKind::Info);
        Ok(())
    }

    fn open_current_link(&mut self) {
        let Some(verse) = self.current_verse() else {
            return;
        };
        match verse.trimmed_link() {
            None => {
                self.set_status("This verse does not have a link.", StatusKind::Error);
            }
            Some(link) => {
                let link = link.to_string();
                let label = verse.primary_number().to_string();
                if let Err(err) = open_link(&link) {
                    self.set_status(format!("Failed to open link: {err}"), StatusKind::Error);
                } else {
                    self.set_status(format!("Opened source for {label}."), StatusKind::Info);
                }
            }
        }
    }

    fn current_verse(&self) -> Option<&Verse> {
        self.verses.get(self.selected)
    }

    fn next_verse(&mut self) {
        if self.selected + 1 < self.verses.len() {
            self.selected += 1;
            self.persist_cursor();
        }
    }

    fn previous_verse(&mut self) {
        if self.selected > 0 && !self.verses.is_empty() {
            self.selected -= 1;
            self.persist_cursor();
        }
    }

    /// Jump directly to `index`. Out-of-bounds requests are silently ignored
    /// rather than treated as errors.
    fn select_index(&mut self, index: usize) {
        if index < self.verses.len() {
            self.selected = index;
            self.persist_cursor();
        }
    }

    /// Best-effort write of the last-viewed slot; the slot swallows its own
    /// failures.
    fn persist_cursor(&mut self) {
        self.cursor_slot.write(self.selected);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_verse_view(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Palette(state) => self.draw_palette(frame, area, state),
            Mode::AddingVerse(form) => self.draw_form(frame, area, "Add Verse", form),
            Mode::EditingVerse { form, .. } => self.draw_form(frame, area, "Edit Verse", form),
            Mode::Normal => {}
        }
    }

    fn draw_verse_view(&self, frame: &mut Frame, area: Rect) {
        let Some(verse) = self.current_verse() else {
            let message = Paragraph::new("No verses yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::NONE));
            frame.render_widget(message, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(1)])
            .split(area);

        let link_line = match verse.trimmed_link() {
            Some(link) => Line::from(vec![
                Span::raw("Source: "),
                Span::styled(link.to_string(), Style::default().fg(Color::Cyan)),
            ]),
            None => Line::from(Span::styled(
                "No source link",
                Style::default().fg(Color::DarkGray),
            )),
        };
        let header = Paragraph::new(vec![
            Line::from(vec![
                Span::styled(
                    verse.display_numbers(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(
                    "  •  {} / {}",
                    self.selected + 1,
                    self.verses.len()
                )),
            ]),
            link_line,
        ])
        .alignment(Alignment::Left)
        .block(Block::default().borders(Borders::ALL).title("Verse"));
        frame.render_widget(header, chunks[0]);

        let mut lines: Vec<Line> = verse
            .verse
            .lines()
            .map(|text| Line::from(text.to_string()))
            .collect();
        lines.push(Line::from(""));
        lines.extend(verse.translation.lines().map(|text| {
            Line::from(Span::styled(
                text.to_string(),
                Style::default().fg(Color::Gray),
            ))
        }));

        if !verse.insights.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Insights",
                Style::default().add_modifier(Modifier::BOLD),
            )));
            for insight in &verse.insights {
                lines.push(Line::from(format!("  • {insight}")));
            }
        }

        let body = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        frame.render_widget(body, chunks[1]);
    }

    fn draw_palette(&self, frame: &mut Frame, area: Rect, state: &PaletteState) {
        let popup_area = centered_rect(70, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Search Verses")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);
        if inner.height == 0 {
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);

        let input = Paragraph::new(Span::raw(format!("Search: {}", state.query)));
        frame.render_widget(input, chunks[0]);
        let cursor_x = chunks[0].x + "Search: ".len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, chunks[0].y));

        let list_area = chunks[1];
        if list_area.height == 0 {
            return;
        }

        if state.matches.is_empty() {
            let message = Paragraph::new(Span::styled(
                "No verses found.",
                Style::default().fg(Color::DarkGray),
            ));
            frame.render_widget(message, list_area);
            return;
        }

        // Keep the highlighted row within the visible window.
        let capacity = list_area.height as usize;
        let len = state.matches.len();
        let mut start = if state.selected >= capacity {
            state.selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);

        let mut rows = Vec::with_capacity(end - start);
        for row in start..end {
            let verse = &self.verses[state.matches[row]];
            let highlighted = row == state.selected;
            let title_style = if highlighted {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            rows.push(Line::from(vec![
                Span::styled(verse.display_numbers(), title_style),
                Span::styled(
                    format!("  {}", truncate_preview(&verse.translation, PREVIEW_WIDTH)),
                    Style::default().fg(Color::DarkGray),
                ),
            ]));
        }

        let list = Paragraph::new(rows);
        frame.render_widget(list, list_area);
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &VerseForm) {
        let popup_area = centered_rect(70, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);
        if inner.height == 0 {
            return;
        }

        let (mut lines, cursor) = form.build_lines();
        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Ctrl+S save • Tab next field • Ctrl+N add citation • Ctrl+D remove slot • Esc cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let cursor_x = min(inner.x + cursor.0, inner.x + inner.width.saturating_sub(1));
        let cursor_y = inner.y + cursor.1;
        if cursor_y < inner.y + inner.height {
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::Palette(_) => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Select   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Jump   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Close"),
            ]),
            Mode::AddingVerse(_) | Mode::EditingVerse { .. } => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next Field   "),
                Span::styled("[Ctrl+S]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Ctrl+N]", key_style),
                Span::raw(" Add Citation   "),
                Span::styled("[Ctrl+D]", key_style),
                Span::raw(" Remove Slot   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::Normal => Line::from(vec![
                Span::styled("[←→]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[Ctrl+K]", key_style),
                Span::raw(" Search   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[e]", key_style),
                Span::raw(" Edit   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Open Link   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }
}
