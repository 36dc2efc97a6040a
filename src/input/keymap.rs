use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::command::Command;

/// What the host should do with one terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    Command(Command),
    /// Terminal size in cells; the host converts it to pixels.
    Resize { columns: u16, rows: u16 },
    Quit,
}

pub fn map_event(event: &Event) -> Option<HostAction> {
    match event {
        Event::Key(key) if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) => {
            map_key(*key)
        }
        Event::Resize(columns, rows) => Some(HostAction::Resize {
            columns: *columns,
            rows: *rows,
        }),
        _ => None,
    }
}

pub fn map_key(key: KeyEvent) -> Option<HostAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(HostAction::Quit),
            _ => None,
        };
    }

    let command = match key.code {
        KeyCode::Char(' ') | KeyCode::Right | KeyCode::PageDown | KeyCode::Char('j') => {
            Command::NextUnit
        }
        KeyCode::Backspace | KeyCode::Left | KeyCode::PageUp | KeyCode::Char('k') => {
            Command::PreviousUnit
        }
        KeyCode::Char('+') | KeyCode::Char('=') => Command::ZoomIn,
        KeyCode::Char('-') => Command::ZoomOut,
        KeyCode::Char('0') => Command::ResetZoom,
        KeyCode::Esc | KeyCode::Char('q') => return Some(HostAction::Quit),
        _ => return None,
    };
    Some(HostAction::Command(command))
}
