//! Button input: a time based debouncer for the raw pin level and the tap session that
//! aggregates presses into bursts.

use crate::{DEBOUNCE, TAP_SETTLE, TAP_WINDOW};
use embassy_time::Instant;

/// An accepted change of the button level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Press,
    Release,
}

/// Accepts a level change only when it differs from the last accepted level and at least
/// [`DEBOUNCE`] has passed since the last accepted change. Everything else is noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    /// Last accepted level, true is pressed
    pressed: bool,
    last_change: Option<Instant>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            pressed: false,
            last_change: None,
        }
    }

    /// Feed the raw level sampled this tick. Returns at most one edge.
    pub fn update(&mut self, pressed: bool, now: Instant) -> Option<Edge> {
        if pressed == self.pressed {
            return None;
        }
        if let Some(last) = self.last_change {
            if now.saturating_duration_since(last) < DEBOUNCE {
                return None;
            }
        }
        self.pressed = pressed;
        self.last_change = Some(now);
        let edge = if pressed { Edge::Press } else { Edge::Release };
        debug!("INPUT: accepted {}", edge);
        Some(edge)
    }

    /// The debounced level
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }
}

/// Counts the presses of one burst. A press within [`TAP_WINDOW`] of the previous one extends
/// the burst; the burst settles once [`TAP_SETTLE`] passes without a new press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapSession {
    count: u32,
    last_tap: Option<Instant>,
}

impl TapSession {
    pub const fn new() -> Self {
        Self {
            count: 0,
            last_tap: None,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn since_last(&self, now: Instant) -> Option<embassy_time::Duration> {
        match (self.count, self.last_tap) {
            (0, _) | (_, None) => None,
            (_, Some(t)) => Some(now.saturating_duration_since(t)),
        }
    }

    /// Close the pending burst if a press at `now` would fall outside its window. Returns the
    /// count of the closed burst so a late press never swallows the burst before it.
    pub fn close_expired(&mut self, now: Instant) -> Option<u32> {
        match self.since_last(now) {
            Some(gap) if gap > TAP_WINDOW => Some(self.take()),
            _ => None,
        }
    }

    /// Register a press and return the running count of the burst
    pub fn register(&mut self, now: Instant) -> u32 {
        self.count = match self.since_last(now) {
            Some(gap) if gap <= TAP_WINDOW => self.count.saturating_add(1),
            _ => 1,
        };
        self.last_tap = Some(now);
        self.count
    }

    /// Returns the final count once the burst has been quiet for [`TAP_SETTLE`]
    pub fn settle(&mut self, now: Instant) -> Option<u32> {
        match self.since_last(now) {
            Some(quiet) if quiet >= TAP_SETTLE => {
                let count = self.take();
                debug!("INPUT: burst settled at {} taps", count);
                Some(count)
            }
            _ => None,
        }
    }

    fn take(&mut self) -> u32 {
        let count = self.count;
        self.reset();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Instant {
        Instant::from_millis(v)
    }

    #[test]
    fn test_debouncer_accepts_spaced_transitions() {
        let mut d = Debouncer::new();
        assert_eq!(d.update(true, ms(1000)), Some(Edge::Press));
        assert_eq!(d.update(false, ms(1050)), Some(Edge::Release));
        assert_eq!(d.update(true, ms(1100)), Some(Edge::Press));
        assert!(d.is_pressed());
    }

    #[test]
    fn test_debouncer_rejects_bounce() {
        let mut d = Debouncer::new();
        assert_eq!(d.update(true, ms(1000)), Some(Edge::Press));
        assert_eq!(d.update(false, ms(1010)), None);
        assert_eq!(d.update(true, ms(1020)), None);
        assert_eq!(d.update(false, ms(1049)), None);
        assert!(d.is_pressed());
    }

    #[test]
    fn test_debouncer_ignores_steady_level() {
        let mut d = Debouncer::new();
        assert_eq!(d.update(false, ms(0)), None);
        assert_eq!(d.update(true, ms(5)), Some(Edge::Press));
        assert_eq!(d.update(true, ms(500)), None);
    }

    #[test]
    fn test_burst_counts_and_settles_once() {
        for n in 1..=6u64 {
            let mut taps = TapSession::new();
            for i in 0..n {
                assert_eq!(taps.register(ms(1000 + i * 300)), (i + 1) as u32);
            }
            let last = 1000 + (n - 1) * 300;
            assert_eq!(taps.settle(ms(last + 599)), None);
            assert_eq!(taps.settle(ms(last + 600)), Some(n as u32));
            assert_eq!(taps.settle(ms(last + 2000)), None);
        }
    }

    #[test]
    fn test_press_after_window_starts_new_burst() {
        let mut taps = TapSession::new();
        taps.register(ms(0));
        assert_eq!(taps.close_expired(ms(300)), None);
        assert_eq!(taps.close_expired(ms(450)), Some(1));
        assert_eq!(taps.register(ms(450)), 1);
    }

    #[test]
    fn test_register_without_close_restarts_count() {
        let mut taps = TapSession::new();
        taps.register(ms(0));
        taps.register(ms(200));
        assert_eq!(taps.register(ms(700)), 1);
    }
}
