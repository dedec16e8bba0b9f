use std::collections::HashMap;
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::window::UtilityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    CycleWindow,
    CloseWindow,
    CycleInterval,
    Toggle(UtilityKind),
    Refresh,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Quit => f.write_str("Quit"),
            Action::CycleWindow => f.write_str("Raise next window"),
            Action::CloseWindow => f.write_str("Close active window"),
            Action::CycleInterval => f.write_str("Next chart interval"),
            Action::Toggle(kind) => write!(f, "Toggle {}", kind.title()),
            Action::Refresh => f.write_str("Reload the active panel"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    pub fn matches(&self, key: &KeyEvent) -> bool {
        key.code == self.code && key.modifiers == self.mods
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, label) in [
            (KeyModifiers::CONTROL, "Ctrl+"),
            (KeyModifiers::SHIFT, "Shift+"),
            (KeyModifiers::ALT, "Alt+"),
        ] {
            if self.mods.contains(flag) {
                f.write_str(label)?;
            }
        }
        match self.code {
            KeyCode::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            KeyCode::F(n) => write!(f, "F{n}"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: HashMap<Action, Vec<KeyCombo>>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use Action::*;
        let none = KeyModifiers::NONE;
        let ctrl = KeyModifiers::CONTROL;
        let mut kb = Self::new();
        kb.add(Quit, KeyCombo::new(KeyCode::Char('q'), ctrl));
        kb.add(CycleWindow, KeyCombo::new(KeyCode::Tab, none));
        kb.add(CloseWindow, KeyCombo::new(KeyCode::Char('w'), ctrl));
        kb.add(CycleInterval, KeyCombo::new(KeyCode::F(8), none));
        let utilities = [
            (1, UtilityKind::Help),
            (2, UtilityKind::Favorites),
            (3, UtilityKind::Chat),
            (4, UtilityKind::Sessions),
            (5, UtilityKind::Intel),
            (6, UtilityKind::Pizza),
            (7, UtilityKind::Quant),
            (12, UtilityKind::DebugLog),
        ];
        for (n, kind) in utilities {
            kb.add(Toggle(kind), KeyCombo::new(KeyCode::F(n), none));
        }
        kb.add(Refresh, KeyCombo::new(KeyCode::Char('r'), ctrl));
        kb
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn add(&mut self, action: Action, combo: KeyCombo) {
        self.map.entry(action).or_default().push(combo);
    }

    pub fn matches(&self, action: Action, key: &KeyEvent) -> bool {
        self.map
            .get(&action)
            .is_some_and(|list| list.iter().any(|c| c.matches(key)))
    }

    pub fn action_for_key(&self, key: &KeyEvent) -> Option<Action> {
        self.map
            .iter()
            .find(|(_, list)| list.iter().any(|c| c.matches(key)))
            .map(|(act, _)| *act)
    }

    /// Actions with their key labels, ordered by label for stable help
    /// output.
    pub fn help_entries(&self) -> Vec<(Action, Vec<String>)> {
        let mut v: Vec<(Action, Vec<String>)> = self
            .map
            .iter()
            .map(|(act, list)| (*act, list.iter().map(KeyCombo::to_string).collect()))
            .collect();
        v.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
        v
    }

    pub fn combos_for(&self, action: Action) -> Vec<String> {
        self.map
            .get(&action)
            .map(|list| list.iter().map(KeyCombo::to_string).collect())
            .unwrap_or_default()
    }
}
