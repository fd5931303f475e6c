//! SQL keyword and table-name autocomplete state and matching logic.

use crate::highlight::KEYWORDS;

/// Autocomplete popup state.
#[derive(Debug, Clone, Default)]
pub struct Autocomplete {
    /// Whether the popup is currently visible.
    pub active: bool,
    /// Current list of matching suggestions.
    pub suggestions: Vec<String>,
    /// Currently selected index in suggestions.
    pub selected: usize,
    /// The prefix being matched (the partial word the user typed).
    pub prefix: String,
}

impl Autocomplete {
    /// Update suggestions based on the current word at cursor.
    /// Call this after every keystroke in the editor. Table names of the
    /// active database are offered after the keywords.
    pub fn update(&mut self, lines: &[String], cursor_row: usize, cursor_col: usize, tables: &[String]) {
        let prefix = extract_current_word(lines, cursor_row, cursor_col);
        if prefix.chars().count() < 2 {
            self.dismiss();
            return;
        }
        let upper = prefix.to_uppercase();
        let matches: Vec<String> = KEYWORDS
            .iter()
            .map(|kw| kw.to_ascii_uppercase())
            .chain(tables.iter().cloned())
            .filter(|word| word.to_uppercase().starts_with(&upper) && word.len() > prefix.len())
            .collect();
        if matches.is_empty() {
            self.dismiss();
        } else {
            self.prefix = prefix;
            self.suggestions = matches;
            self.selected = self.selected.min(self.suggestions.len().saturating_sub(1));
            self.active = true;
        }
    }

    /// Dismiss the autocomplete popup.
    pub fn dismiss(&mut self) {
        self.active = false;
        self.suggestions.clear();
        self.selected = 0;
        self.prefix.clear();
    }

    /// Move selection up.
    pub fn prev(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.suggestions.len() - 1);
        }
    }

    /// Move selection down.
    pub fn next(&mut self) {
        if !self.suggestions.is_empty() {
            self.selected = (self.selected + 1) % self.suggestions.len();
        }
    }

    /// Get the currently selected suggestion, if any.
    pub fn selected_word(&self) -> Option<&str> {
        self.suggestions.get(self.selected).map(String::as_str)
    }
}

/// Extract the current word being typed at the cursor position.
/// `col` counts characters, as the editor cursor does.
fn extract_current_word(lines: &[String], row: usize, col: usize) -> String {
    let Some(line) = lines.get(row) else {
        return String::new();
    };
    let before: Vec<char> = line.chars().take(col).collect();
    let start = before
        .iter()
        .rposition(|c| !(c.is_alphanumeric() || *c == '_'))
        .map(|i| i + 1)
        .unwrap_or(0);
    before[start..].iter().collect()
}
