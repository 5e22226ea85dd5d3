use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

/// Single line prompt used by the search and filter menus.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize, // in chars
    finished: bool,
    canceled: bool,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub finished: bool,
    pub canceled: bool,
    pub curser_pos: usize,
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
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.curser_pos = self.curser_pos.saturating_sub(1),
            (KeyCode::Right, _) => {
                self.curser_pos = std::cmp::min(self.curser_pos + 1, self.len());
            }
            (KeyCode::Home, _) => self.curser_pos = 0,
            (KeyCode::End, _) => self.curser_pos = self.len(),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.current_input.clear();
                self.curser_pos = 0;
            }
            (KeyCode::Char(chr), m) if !m.contains(KeyModifiers::CONTROL) => {
                self.current_input.insert(self.bytepos(self.curser_pos), chr);
                self.curser_pos += 1;
            }
            (code, _) => trace!("Ignoring input key {code:?}"),
        }
        self.get()
    }

    /// Prefills the prompt, e.g. with the filter already active on a column.
    pub fn set(&mut self, s: &str) {
        self.current_input = s.to_string();
        self.curser_pos = self.len();
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.current_input.clone(),
            finished: self.finished,
            canceled: self.canceled,
            curser_pos: self.curser_pos,
        }
    }

    pub fn clear(&mut self) {
        self.canceled = false;
        self.finished = false;
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn len(&self) -> usize {
        self.current_input.chars().count()
    }

    fn backspace(&mut self) {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            self.current_input.remove(self.bytepos(self.curser_pos));
        }
    }

    fn delete(&mut self) {
        if self.curser_pos < self.len() {
            self.current_input.remove(self.bytepos(self.curser_pos));
        }
    }

    fn bytepos(&self, char_pos: usize) -> usize {
        self.current_input
            .char_indices()
            .nth(char_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}
