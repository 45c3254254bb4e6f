use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line editor for the command line. The cursor counts characters, not
/// bytes.
#[derive(Debug, Default)]
pub struct Inputter {
    text: String,
    cursor: usize,
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub cursor: usize,
}

impl Inputter {
    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => self.finished = true,
            (KeyCode::Esc, _) => {
                self.clear();
                self.canceled = true;
                self.finished = true;
            }
            (KeyCode::Backspace, _) => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_pos(self.cursor);
                    self.text.remove(at);
                }
            }
            (KeyCode::Delete, _) => {
                if self.cursor < self.len() {
                    let at = self.byte_pos(self.cursor);
                    self.text.remove(at);
                }
            }
            (KeyCode::Left, _) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor = (self.cursor + 1).min(self.len()),
            (KeyCode::Home, _) => self.cursor = 0,
            (KeyCode::End, _) => self.cursor = self.len(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.text.clear();
                self.cursor = 0;
            }
            (KeyCode::Char(chr), m) if !m.contains(KeyModifiers::CONTROL) => {
                let at = self.byte_pos(self.cursor);
                self.text.insert(at, chr);
                self.cursor += 1;
            }
            _ => trace!("Ignoring key {key:?} in command line"),
        }
        self.get()
    }

    /// Starts a new edit, prefilled with `text`.
    pub fn start(&mut self, text: &str) {
        self.clear();
        self.text = text.to_string();
        self.cursor = self.len();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.text.clone(),
            finished: self.finished,
            canceled: self.canceled,
            cursor: self.cursor,
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.finished = false;
        self.canceled = false;
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_pos(&self, cursor: usize) -> usize {
        self.text
            .char_indices()
            .nth(cursor)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_keys(input: &mut Inputter, keys: &[KeyCode]) -> InputResult {
        let mut last = input.get();
        for &code in keys {
            last = input.read(KeyEvent::new(code, KeyModifiers::NONE));
        }
        last
    }

    #[test]
    fn edits_in_the_middle_of_multibyte_text() {
        let mut input = Inputter::default();
        input.start("añb");
        let result = type_keys(
            &mut input,
            &[KeyCode::Left, KeyCode::Backspace, KeyCode::Char('x'), KeyCode::Enter],
        );
        assert_eq!(result.input, "axb");
        assert_eq!(result.cursor, 2);
        assert!(result.finished && !result.canceled);
    }

    #[test]
    fn escape_cancels_and_clears() {
        let mut input = Inputter::default();
        let result = type_keys(&mut input, &[KeyCode::Char('n'), KeyCode::Esc]);
        assert!(result.finished && result.canceled);
        assert!(result.input.is_empty());
    }

    #[test]
    fn home_end_and_delete() {
        let mut input = Inputter::default();
        input.start("abc");
        let result = type_keys(&mut input, &[KeyCode::Home, KeyCode::Delete]);
        assert_eq!(result.input, "bc");
        assert_eq!(result.cursor, 0);
        let result = type_keys(&mut input, &[KeyCode::End, KeyCode::Right]);
        assert_eq!(result.cursor, 2);
        input.read(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(input.get().input.is_empty());
    }
}
