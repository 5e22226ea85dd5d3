use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, TQConfig, TQError};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TQConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TQError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let message = match event::read()? {
            // crossterm also emits key release and repeat events on Windows.
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Some(Message::RawKey(key))
                } else {
                    self.handle_key(key)
                }
            }
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            _ => None,
        };
        Ok(message)
    }

    fn handle_key(&self, key: KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Up | KeyCode::Char('k') => Some(Message::MoveUp),
            KeyCode::Down | KeyCode::Char('j') => Some(Message::MoveDown),
            KeyCode::Left | KeyCode::Char('h') => Some(Message::MoveLeft),
            KeyCode::Right | KeyCode::Char('l') => Some(Message::MoveRight),
            KeyCode::PageDown => Some(Message::NextPage),
            KeyCode::PageUp => Some(Message::PreviousPage),
            KeyCode::Char('+') => Some(Message::MoreRowsPerPage),
            KeyCode::Char('-') => Some(Message::FewerRowsPerPage),
            KeyCode::Char('/') => Some(Message::Search),
            KeyCode::Char('f') => Some(Message::Filter),
            KeyCode::Char('F') => Some(Message::ClearFilters),
            KeyCode::Char('s') => Some(Message::Sort),
            KeyCode::Char('S') => Some(Message::ClearSort),
            KeyCode::Char('o') => Some(Message::SortMenu),
            KeyCode::Char('c') => Some(Message::ColumnMenu),
            KeyCode::Char(' ') => Some(Message::Toggle),
            KeyCode::Enter => Some(Message::Enter),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('?') => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
