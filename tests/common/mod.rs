//! Simulated ring, keyboard and clock for driving a `Device` tick by tick

#![allow(dead_code)]

use embassy_time::Instant;
use macro_button::config::Settings;
use macro_button::drivers::{LedBuffer, PixelSink};
use macro_button::keyboard::{Key, KeyboardSink};
use macro_button::{Device, TickOutcome};
use smart_leds::RGB8;

/// Ticks are this far apart, matching the firmware loop
pub const TICK_MS: u64 = 5;

#[derive(Debug, Default)]
pub struct Ring {
    pixels: LedBuffer,
    pub frames: Vec<LedBuffer>,
}

impl Ring {
    pub fn last(&self) -> Option<&LedBuffer> {
        self.frames.last()
    }

    pub fn lit(&self) -> usize {
        self.last()
            .map_or(0, |f| f.iter().filter(|p| **p != RGB8::default()).count())
    }
}

impl PixelSink for Ring {
    fn set(&mut self, index: usize, colour: RGB8) {
        self.pixels[index] = colour;
    }

    fn show(&mut self) {
        self.frames.push(self.pixels);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Press(Key),
    ReleaseAll,
    Print(String),
}

#[derive(Debug, Default)]
pub struct Keys {
    pub events: Vec<KeyEvent>,
}

impl KeyboardSink for Keys {
    fn press(&mut self, key: Key) {
        self.events.push(KeyEvent::Press(key));
    }

    fn release_all(&mut self) {
        self.events.push(KeyEvent::ReleaseAll);
    }

    fn print(&mut self, text: &str) {
        self.events.push(KeyEvent::Print(text.to_string()));
    }
}

pub struct Rig {
    pub device: Device,
    pub ring: Ring,
    pub keys: Keys,
    pub now: u64,
    pub pressed: bool,
    pub outcomes: Vec<(u64, TickOutcome)>,
}

impl Rig {
    pub fn new(settings: Settings) -> Self {
        Self {
            device: Device::new(settings),
            ring: Ring::default(),
            keys: Keys::default(),
            now: 0,
            pressed: false,
            outcomes: Vec::new(),
        }
    }

    pub fn instant(&self) -> Instant {
        Instant::from_millis(self.now)
    }

    /// One tick with the current button level
    pub fn tick(&mut self) {
        self.now += TICK_MS;
        let outcome = self.device.tick(
            Instant::from_millis(self.now),
            self.pressed,
            &mut self.ring,
            &mut self.keys,
        );
        if outcome != TickOutcome::Continue {
            self.outcomes.push((self.now, outcome));
        }
    }

    pub fn advance(&mut self, ms: u64) {
        let until = self.now + ms;
        while self.now < until {
            self.tick();
        }
    }

    /// Press for 80ms, release for 80ms. Consecutive taps land in one burst.
    pub fn tap(&mut self) {
        self.pressed = true;
        self.advance(80);
        self.pressed = false;
        self.advance(80);
    }

    pub fn taps(&mut self, n: usize) {
        for _ in 0..n {
            self.tap();
        }
    }
}
