//! keyboard input.

use {
    crate::dashboard::Key,
    crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    std::{collections::VecDeque, io, time::Duration},
};

/// abstracts over sources of key presses.
pub trait Keyboard {
    /// returns the next key press, without blocking.
    fn poll_key(&mut self) -> io::Result<Option<Key>>;
}

/// reads key presses from the terminal.
#[derive(Debug, Default)]
pub struct Console;

/// a scripted keyboard.
#[derive(Debug, Default)]
#[allow(dead_code, reason = "this is a testing utility.")]
pub struct MockKeyboard {
    keys: VecDeque<Option<Key>>,
}

// === impl Console ===

impl Keyboard for Console {
    fn poll_key(&mut self) -> io::Result<Option<Key>> {
        if !event::poll(Duration::ZERO)? {
            return Ok(None);
        }

        match event::read()? {
            Event::Key(event) => Ok(key(event)),
            _ => Ok(None),
        }
    }
}

/// maps a terminal key event to a dashboard [`Key`].
///
/// only presses count. unbound keys map to `None`.
pub fn key(event: KeyEvent) -> Option<Key> {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = event;

    if kind != KeyEventKind::Press {
        return None;
    }

    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    match code {
        KeyCode::Char('c') if ctrl => Some(Key::Quit),
        KeyCode::Char('r') if ctrl => Some(Key::Reset),
        _ if ctrl => None,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(Key::Quit),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Char('1') => Some(Key::Digit1),
        KeyCode::Char('2') => Some(Key::Digit2),
        _ => None,
    }
}

// === impl MockKeyboard ===

#[allow(dead_code, reason = "this is a testing utility.")]
impl MockKeyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// queues a key press.
    pub fn press(mut self, key: Key) -> Self {
        self.keys.push_back(Some(key));
        self
    }

    /// queues a poll that finds nothing.
    pub fn nothing(mut self) -> Self {
        self.keys.push_back(None);
        self
    }
}

impl Keyboard for MockKeyboard {
    fn poll_key(&mut self) -> io::Result<Option<Key>> {
        Ok(self.keys.pop_front().flatten())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crossterm::event::KeyEventState};

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        for event in [
            press(KeyCode::Char('q'), KeyModifiers::NONE),
            press(KeyCode::Char('Q'), KeyModifiers::SHIFT),
            press(KeyCode::Esc, KeyModifiers::NONE),
            press(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            assert_eq!(key(event), Some(Key::Quit), "{event:?}");
        }
    }

    #[test]
    fn control_r_resets() {
        assert_eq!(
            key(press(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            Some(Key::Reset)
        );
        assert_eq!(key(press(KeyCode::Char('r'), KeyModifiers::NONE)), None);
    }

    #[test]
    fn arrows_and_digits() {
        assert_eq!(key(press(KeyCode::Left, KeyModifiers::NONE)), Some(Key::Left));
        assert_eq!(key(press(KeyCode::Right, KeyModifiers::NONE)), Some(Key::Right));
        assert_eq!(key(press(KeyCode::Char('1'), KeyModifiers::NONE)), Some(Key::Digit1));
        assert_eq!(key(press(KeyCode::Char('2'), KeyModifiers::NONE)), Some(Key::Digit2));
        assert_eq!(key(press(KeyCode::Char('3'), KeyModifiers::NONE)), None);
        assert_eq!(key(press(KeyCode::Char('1'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn releases_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(key(release), None);
    }

    #[test]
    fn mock_keyboard() {
        let mut keyboard = MockKeyboard::new().nothing().press(Key::Right);
        assert_eq!(keyboard.poll_key().unwrap(), None);
        assert_eq!(keyboard.poll_key().unwrap(), Some(Key::Right));
        assert_eq!(keyboard.poll_key().unwrap(), None);
    }
}
