use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

use crate::app::Result;

pub enum AppEvent {
    Key(KeyEvent),
    /// The terminal regained focus; feeds the cache's focus-refetch trigger.
    Focus,
    Tick,
}

pub struct EventHandler {
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        Self { tick_rate }
    }

    pub fn next(&self) -> Result<AppEvent> {
        if event::poll(self.tick_rate)? {
            match event::read()? {
                Event::Key(key) => return Ok(AppEvent::Key(key)),
                Event::FocusGained => return Ok(AppEvent::Focus),
                _ => {}
            }
        }
        Ok(AppEvent::Tick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Back,
    MoveUp,
    MoveDown,
    NextPane,
    PrevPane,
    Select,
    NextPage,
    PrevPage,
    SlideNext,
    SlidePrev,
    ToggleVideo,
    OpenMedia,
    Search,
    Refresh,
    Home,
    None,
}

impl From<KeyEvent> for Action {
    fn from(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Esc | KeyCode::Backspace => Action::Back,
            KeyCode::Char('j') | KeyCode::Down => Action::MoveDown,
            KeyCode::Char('k') | KeyCode::Up => Action::MoveUp,
            KeyCode::Tab => Action::NextPane,
            KeyCode::BackTab => Action::PrevPane,
            KeyCode::Enter => Action::Select,
            KeyCode::Char('n') | KeyCode::PageDown => Action::NextPage,
            KeyCode::Char('p') | KeyCode::PageUp => Action::PrevPage,
            KeyCode::Char(']') | KeyCode::Right => Action::SlideNext,
            KeyCode::Char('[') | KeyCode::Left => Action::SlidePrev,
            KeyCode::Char(' ') => Action::ToggleVideo,
            KeyCode::Char('o') => Action::OpenMedia,
            KeyCode::Char('/') => Action::Search,
            KeyCode::Char('R') => Action::Refresh,
            KeyCode::Char('h') => Action::Home,
            _ => Action::None,
        }
    }
}
