//! Keys the macro language can press and the sink they are sent to.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpecialKey {
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    /// F1 to F12
    F(u8),
}

/// Left hand modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Gui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    Char(char),
    Special(SpecialKey),
    Modifier(Modifier),
}

/// Keystroke output, normally a USB HID keyboard report stream
pub trait KeyboardSink {
    fn press(&mut self, key: Key);

    fn release_all(&mut self);

    /// Type `text` as individual keystrokes
    fn print(&mut self, text: &str);
}

/// A set of modifiers, pressed in a fixed order whatever order they were written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub gui: bool,
}

impl Modifiers {
    pub fn press<K: KeyboardSink>(&self, keyboard: &mut K) {
        let held = [
            (self.ctrl, Modifier::Ctrl),
            (self.shift, Modifier::Shift),
            (self.alt, Modifier::Alt),
            (self.gui, Modifier::Gui),
        ];
        for (_, modifier) in held.iter().filter(|(on, _)| *on) {
            keyboard.press(Key::Modifier(*modifier));
        }
    }
}

/// Resolve a special key name, case-insensitive. `SPACE` is the space character.
pub fn special_key(name: &str) -> Option<Key> {
    let name = name.trim();
    let special = |key| Some(Key::Special(key));
    const NAMED: &[(&str, SpecialKey)] = &[
        ("RETURN", SpecialKey::Enter),
        ("ENTER", SpecialKey::Enter),
        ("ESCAPE", SpecialKey::Escape),
        ("ESC", SpecialKey::Escape),
        ("TAB", SpecialKey::Tab),
        ("BACKSPACE", SpecialKey::Backspace),
        ("DELETE", SpecialKey::Delete),
        ("UP", SpecialKey::Up),
        ("DOWN", SpecialKey::Down),
        ("LEFT", SpecialKey::Left),
        ("RIGHT", SpecialKey::Right),
        ("HOME", SpecialKey::Home),
        ("END", SpecialKey::End),
    ];
    if let Some(&(_, key)) = NAMED.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
        return special(key);
    }
    if name.eq_ignore_ascii_case("SPACE") {
        return Some(Key::Char(' '));
    }
    let number = name
        .strip_prefix('F')
        .or_else(|| name.strip_prefix('f'))
        .filter(|n| n.len() <= 2)?;
    match number.parse::<u8>() {
        Ok(n @ 1..=12) => special(SpecialKey::F(n)),
        _ => None,
    }
}

/// A key written as a single literal character
pub fn literal_key(text: &str) -> Option<Key> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(Key::Char(c)),
        _ => None,
    }
}
