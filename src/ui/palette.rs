use crate::models::Verse;

/// State of the command palette: the live query plus the indices of the
/// records that currently match it.
///
/// `matches` always holds indices into the *original* verse list, never
/// positions within the filtered view. Selecting the k-th visible row must
/// relocate the navigation cursor to the right record, and resolving that
/// through original-list indices is what makes it immune to the classic
/// filtered-index-off-by-everything defect.
pub(crate) struct PaletteState {
    pub(crate) query: String,
    pub(crate) matches: Vec<usize>,
    pub(crate) selected: usize,
}

impl PaletteState {
    /// Open the palette over the full collection: an empty query matches
    /// everything in original order.
    pub(crate) fn new(verses: &[Verse]) -> Self {
        let mut state = Self {
            query: String::new(),
            matches: Vec::new(),
            selected: 0,
        };
        state.refilter(verses);
        state
    }

    pub(crate) fn push_char(&mut self, verses: &[Verse], ch: char) {
        if ch.is_control() {
            return;
        }
        self.query.push(ch);
        self.refilter(verses);
    }

    pub(crate) fn backspace(&mut self, verses: &[Verse]) {
        self.query.pop();
        self.refilter(verses);
    }

    /// Recompute the match set. Case-insensitive substring match against
    /// citation labels, verse text, translation, and the normalized cache.
    fn refilter(&mut self, verses: &[Verse]) {
        let needle = self.query.trim().to_lowercase();
        self.matches = if needle.is_empty() {
            (0..verses.len()).collect()
        } else {
            verses
                .iter()
                .enumerate()
                .filter(|(_, verse)| verse.matches_query(&needle))
                .map(|(index, _)| index)
                .collect()
        };

        if self.matches.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.matches.len() {
            self.selected = self.matches.len() - 1;
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.matches.is_empty() {
            return;
        }
        let len = self.matches.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        if !self.matches.is_empty() {
            self.selected = self.matches.len() - 1;
        }
    }

    /// Original-list index of the highlighted row, if any row matches.
    pub(crate) fn current_verse_index(&self) -> Option<usize> {
        self.matches.get(self.selected).copied()
    }
}
