// Terminal input - reads crossterm events on a blocking thread and forwards
// them as messages into the app's queue

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::{KeyInput, Message};

const POLL_TIMEOUT: Duration = Duration::from_millis(50);

pub struct EventHandler {
    _reader: JoinHandle<()>,
}

impl EventHandler {
    /// Starts reading. Stops by itself once the receiving side is gone.
    pub fn spawn(sender: mpsc::UnboundedSender<Message>) -> Self {
        let handle = tokio::task::spawn_blocking(move || {
            while !sender.is_closed() {
                match event::poll(POLL_TIMEOUT) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        warn!("terminal poll failed: {e}");
                        break;
                    }
                }
                let msg = match event::read() {
                    Ok(event) => to_message(event),
                    Err(e) => {
                        warn!("terminal read failed: {e}");
                        break;
                    }
                };
                if let Some(msg) = msg {
                    if sender.send(msg).is_err() {
                        break;
                    }
                }
            }
            debug!("terminal event reader stopped");
        });
        Self { _reader: handle }
    }
}

pub fn to_message(event: Event) -> Option<Message> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => to_key_input(key).map(Message::Key),
        Event::Resize(width, height) => Some(Message::Resize { width, height }),
        _ => None,
    }
}

pub fn to_key_input(key: KeyEvent) -> Option<KeyInput> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(KeyInput::CtrlC),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(c) => Some(KeyInput::Char(c)),
        KeyCode::Up => Some(KeyInput::Up),
        KeyCode::Down => Some(KeyInput::Down),
        KeyCode::Left => Some(KeyInput::Left),
        KeyCode::Right => Some(KeyInput::Right),
        KeyCode::Enter => Some(KeyInput::Enter),
        KeyCode::Esc => Some(KeyInput::Esc),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_ctrl_c_is_its_own_key() {
        assert_eq!(
            to_key_input(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyInput::CtrlC)
        );
        assert_eq!(
            to_key_input(key(KeyCode::Char('c'), KeyModifiers::NONE)),
            Some(KeyInput::Char('c'))
        );
        assert_eq!(to_key_input(key(KeyCode::Char('x'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn test_releases_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(to_message(Event::Key(release)), None);
        assert_eq!(
            to_message(Event::Key(key(KeyCode::Enter, KeyModifiers::NONE))),
            Some(Message::Key(KeyInput::Enter))
        );
    }

    #[test]
    fn test_resize_becomes_message() {
        assert_eq!(
            to_message(Event::Resize(80, 24)),
            Some(Message::Resize { width: 80, height: 24 })
        );
        assert_eq!(to_message(Event::FocusGained), None);
    }
}
