//! Persistent device settings.
//!
//! Storage itself lives outside the core. The firmware hands a [`Settings`] value to the
//! [`Device`](crate::Device) at boot and the device only reads it afterwards.

use crate::MACRO_CAPACITY;
use core::fmt;
use heapless::String;

/// What a settled single press does while idle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinglePressMode {
    /// Toggle the party effect
    #[default]
    Party,
    /// Run the stored macro
    Macro,
}

impl SinglePressMode {
    /// Decode a stored mode. Older firmware stored the macro mode as 3, every unknown value
    /// falls back to party.
    pub fn from_stored(value: i32) -> Self {
        match value {
            1 | 3 => SinglePressMode::Macro,
            _ => SinglePressMode::Party,
        }
    }

    pub fn stored(self) -> i32 {
        match self {
            SinglePressMode::Party => 0,
            SinglePressMode::Macro => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SettingsError {
    /// The macro program does not fit in storage
    MacroTooLong,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MacroTooLong => write!(f, "macro longer than {MACRO_CAPACITY} bytes"),
        }
    }
}

pub type MacroText = String<MACRO_CAPACITY>;

const DEFAULT_MACRO: &str = "LED GREEN\nDELAY 1000\nLED OFF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    single_press_mode: SinglePressMode,
    macro_text: MacroText,
    led_pin: u8,
    button_pin: u8,
}

impl Default for Settings {
    fn default() -> Self {
        let mut macro_text = MacroText::new();
        // Always fits, the default program is far below capacity
        let _ = macro_text.push_str(DEFAULT_MACRO);
        Self {
            single_press_mode: SinglePressMode::default(),
            macro_text,
            led_pin: 3,
            button_pin: 0,
        }
    }
}

impl Settings {
    pub fn with_mode(mut self, mode: SinglePressMode) -> Self {
        self.single_press_mode = mode;
        self
    }

    /// Replace the macro program
    pub fn with_macro(mut self, text: &str) -> Result<Self, SettingsError> {
        self.macro_text = MacroText::try_from(text).map_err(|_| SettingsError::MacroTooLong)?;
        Ok(self)
    }

    pub fn with_led_pin(mut self, pin: u8) -> Self {
        self.led_pin = pin;
        self
    }

    pub fn single_press_mode(&self) -> SinglePressMode {
        self.single_press_mode
    }

    pub fn macro_text(&self) -> &str {
        &self.macro_text
    }

    pub fn led_pin(&self) -> u8 {
        self.led_pin
    }

    pub fn button_pin(&self) -> u8 {
        self.button_pin
    }
}
