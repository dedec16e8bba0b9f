use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Evens out key reporting across terminals. Releases are never wanted;
/// held-down repeats are kept for typing into the ticker and chat inputs
/// but not for Esc, which would close several things at once.
#[derive(Debug, Default)]
pub struct KeyboardNormalizer {
    esc_held: bool,
}

impl KeyboardNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn normalize(&mut self, event: Event) -> Option<Event> {
        match event {
            Event::Key(key) => self.key(key).map(Event::Key),
            other => Some(other),
        }
    }

    fn key(&mut self, mut key: KeyEvent) -> Option<KeyEvent> {
        let is_esc = key.code == KeyCode::Esc;
        match key.kind {
            KeyEventKind::Release => {
                if is_esc {
                    self.esc_held = false;
                }
                return None;
            }
            KeyEventKind::Repeat if is_esc => return None,
            KeyEventKind::Press if is_esc && self.esc_held => return None,
            _ => {}
        }
        // Terminals that report releases also tell us when Esc comes back up;
        // elsewhere every Esc press counts.
        self.esc_held = is_esc && cfg!(windows);

        if key.code == KeyCode::Tab && key.modifiers.contains(KeyModifiers::SHIFT) {
            key.code = KeyCode::BackTab;
            key.modifiers.remove(KeyModifiers::SHIFT);
        }
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_kind(code: KeyCode, kind: KeyEventKind) -> Event {
        let mut key = KeyEvent::new(code, KeyModifiers::NONE);
        key.kind = kind;
        Event::Key(key)
    }

    #[test]
    fn shift_tab_is_reported_as_backtab() {
        let mut norm = KeyboardNormalizer::new();
        let key = KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT);
        let Some(Event::Key(k)) = norm.normalize(Event::Key(key)) else {
            panic!("expected key event");
        };
        assert_eq!(k.code, KeyCode::BackTab);
        assert!(k.modifiers.is_empty());
    }

    #[test]
    fn releases_and_esc_repeats_are_dropped() {
        let mut norm = KeyboardNormalizer::new();
        assert!(
            norm.normalize(with_kind(KeyCode::Char('t'), KeyEventKind::Release))
                .is_none()
        );
        assert!(
            norm.normalize(with_kind(KeyCode::Esc, KeyEventKind::Repeat))
                .is_none()
        );
        assert!(
            norm.normalize(with_kind(KeyCode::Char('t'), KeyEventKind::Repeat))
                .is_some()
        );
    }

    #[test]
    fn esc_press_after_release_passes() {
        let mut norm = KeyboardNormalizer::new();
        assert!(norm.normalize(with_kind(KeyCode::Esc, KeyEventKind::Press)).is_some());
        norm.normalize(with_kind(KeyCode::Esc, KeyEventKind::Release));
        assert!(norm.normalize(with_kind(KeyCode::Esc, KeyEventKind::Press)).is_some());
    }

    #[test]
    fn non_key_events_pass_through() {
        let mut norm = KeyboardNormalizer::new();
        assert_eq!(norm.normalize(Event::Resize(80, 24)), Some(Event::Resize(80, 24)));
    }
}
