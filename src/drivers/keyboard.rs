use crate::keyboard::{Key, KeyboardSink};

/// Stand-in keyboard for boards without a USB HID endpoint. Keystrokes only go to the log.
#[derive(Debug, Default)]
pub struct LogKeyboard;

impl KeyboardSink for LogKeyboard {
    fn press(&mut self, key: Key) {
        info!("KEYBOARD: press {}", key);
    }

    fn release_all(&mut self) {
        debug!("KEYBOARD: release all");
    }

    fn print(&mut self, text: &str) {
        info!("KEYBOARD: type {=str}", text);
    }
}
