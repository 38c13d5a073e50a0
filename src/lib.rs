#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible to every module below
#[macro_use]
mod fmt;

pub mod animations;
pub mod colour;
pub mod config;
pub mod device;
pub mod drivers;
pub mod input;
pub mod interaction;
pub mod keyboard;
pub mod macros;
pub mod maths;
pub mod remote;
#[cfg(feature = "esp32c3")]
pub mod tasks;

pub use device::{Device, TickOutcome};

use embassy_time::Duration;

/// Firmware version reported over the remote LED surface
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The number of LEDs in the ring we are driving
pub const LED_RING_SIZE: usize = 6;

/// Global brightness applied by the LED driver (0-255)
pub const LED_BRIGHTNESS: u8 = 80;

/// A raw level change is only accepted this long after the previous accepted change
pub const DEBOUNCE: Duration = Duration::from_millis(50);

/// Maximum gap between two presses of the same burst
pub const TAP_WINDOW: Duration = Duration::from_millis(400);

/// Quiet time after the last press before a burst is considered final
pub const TAP_SETTLE: Duration = Duration::from_millis(600);

/// Focus setup is abandoned if no tap arrives within this time
pub const FOCUS_SETUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Each settled tap in focus setup adds this many minutes
pub const FOCUS_MINUTES_PER_TAP: u32 = 20;

/// Focus sessions are clamped to this many minutes
pub const FOCUS_MAX_MINUTES: u32 = 120;

/// Length of the confirmation wipe shown before the countdown starts
pub const FOCUS_WIPE: Duration = Duration::from_secs(5);

/// Upper bound for a single `DELAY` or `SPIN` macro instruction
pub const MACRO_MAX_WAIT: Duration = Duration::from_secs(30);

/// Holding the button this long requests a factory reset
pub const FACTORY_RESET_HOLD: Duration = Duration::from_secs(10);

/// Capacity of the stored macro program in bytes
pub const MACRO_CAPACITY: usize = 1024;
