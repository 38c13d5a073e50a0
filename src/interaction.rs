//! Tap driven UI state machine.
//!
//! Turns presses and settled burst counts into [`Action`]s. It never touches the LEDs or the
//! keyboard itself, the [`Device`](crate::Device) carries the actions out. Every transition is a
//! total function of the current state, the burst count and the elapsed time.

use crate::input::TapSession;
use crate::{FOCUS_MAX_MINUTES, FOCUS_MINUTES_PER_TAP, FOCUS_SETUP_TIMEOUT};
use embassy_time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiState {
    Idle,
    /// Waiting for the duration taps
    FocusSetup,
    /// Confirmation wipe and countdown
    FocusActive,
    /// The focus session ran out and the alarm is showing
    FocusAlarm,
}

/// What the device has to do in response to input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Run the configured single press action
    SinglePress,
    EnterFocusSetup,
    /// Show how many duration taps have been registered so far
    TallyTaps(u32),
    StartFocus(Duration),
    CancelFocus,
    SetupTimedOut,
    Alarm,
    DismissAlarm,
}

/// The running focus session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FocusTimer {
    pub minutes: u32,
    pub duration: Duration,
    /// When the confirmation wipe started
    pub started: Instant,
}

/// Minutes of focus for a settled count of duration taps. Zero taps never start a session.
pub fn focus_minutes(taps: u32) -> Option<u32> {
    if taps == 0 {
        return None;
    }
    Some(
        taps.saturating_mul(FOCUS_MINUTES_PER_TAP)
            .clamp(FOCUS_MINUTES_PER_TAP, FOCUS_MAX_MINUTES),
    )
}

#[derive(Debug, Clone)]
pub struct Interaction {
    state: UiState,
    taps: TapSession,
    setup_started: Instant,
    focus: Option<FocusTimer>,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub const fn new() -> Self {
        Self {
            state: UiState::Idle,
            taps: TapSession::new(),
            setup_started: Instant::from_ticks(0),
            focus: None,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn focus_timer(&self) -> Option<FocusTimer> {
        self.focus
    }

    pub fn pending_taps(&self) -> u32 {
        self.taps.count()
    }

    fn enter(&mut self, next: UiState) {
        if next != self.state {
            info!("UI: {} -> {}", self.state, next);
        }
        self.state = next;
    }

    /// Settle a burst that a press at `now` can no longer extend. Call this before [`press`].
    ///
    /// [`press`]: Interaction::press
    pub fn close_burst(&mut self, now: Instant) -> Option<Action> {
        let count = self.taps.close_expired(now)?;
        self.settled(count, now)
    }

    /// Handle a debounced press
    pub fn press(&mut self, now: Instant) -> Option<Action> {
        match self.state {
            UiState::Idle => {
                // A second press inside the window is the focus gesture, not two single presses
                if self.taps.register(now) >= 2 {
                    self.taps.reset();
                    self.setup_started = now;
                    self.enter(UiState::FocusSetup);
                    Some(Action::EnterFocusSetup)
                } else {
                    None
                }
            }
            UiState::FocusSetup => Some(Action::TallyTaps(self.taps.register(now))),
            UiState::FocusActive => {
                if self.taps.register(now) >= 2 {
                    self.taps.reset();
                    self.focus = None;
                    self.enter(UiState::Idle);
                    Some(Action::CancelFocus)
                } else {
                    None
                }
            }
            UiState::FocusAlarm => {
                self.taps.register(now);
                None
            }
        }
    }

    /// Per tick check for settled bursts and the focus setup timeout
    pub fn poll(&mut self, now: Instant) -> Option<Action> {
        if let Some(count) = self.taps.settle(now) {
            return self.settled(count, now);
        }
        if self.state == UiState::FocusSetup
            && self.taps.count() == 0
            && now.saturating_duration_since(self.setup_started) >= FOCUS_SETUP_TIMEOUT
        {
            self.enter(UiState::Idle);
            return Some(Action::SetupTimedOut);
        }
        None
    }

    /// The effect engine saw the countdown run out
    pub fn timer_expired(&mut self) -> Option<Action> {
        if self.state != UiState::FocusActive {
            return None;
        }
        self.focus = None;
        self.taps.reset();
        self.enter(UiState::FocusAlarm);
        Some(Action::Alarm)
    }

    fn settled(&mut self, count: u32, now: Instant) -> Option<Action> {
        match self.state {
            UiState::Idle if count == 1 => Some(Action::SinglePress),
            UiState::Idle => None,
            UiState::FocusSetup => {
                let minutes = focus_minutes(count)?;
                let duration = Duration::from_secs(minutes as u64 * 60);
                self.focus = Some(FocusTimer {
                    minutes,
                    duration,
                    started: now,
                });
                self.enter(UiState::FocusActive);
                Some(Action::StartFocus(duration))
            }
            // A lone tap during the countdown is dropped
            UiState::FocusActive => None,
            UiState::FocusAlarm if count >= 1 => {
                self.enter(UiState::Idle);
                Some(Action::DismissAlarm)
            }
            UiState::FocusAlarm => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Instant {
        Instant::from_millis(v)
    }

    /// Press at each time in turn, settling bursts the way the device does
    fn feed(ui: &mut Interaction, presses: &[u64]) -> heapless::Vec<Action, 16> {
        let mut actions = heapless::Vec::new();
        for &t in presses {
            if let Some(a) = ui.close_burst(ms(t)) {
                actions.push(a).ok();
            }
            if let Some(a) = ui.press(ms(t)) {
                actions.push(a).ok();
            }
        }
        actions
    }

    #[test]
    fn test_focus_minutes_clamped() {
        assert_eq!(focus_minutes(0), None);
        assert_eq!(focus_minutes(1), Some(20));
        assert_eq!(focus_minutes(3), Some(60));
        assert_eq!(focus_minutes(6), Some(120));
        assert_eq!(focus_minutes(200), Some(120));
        assert_eq!(focus_minutes(u32::MAX), Some(120));
    }

    #[test]
    fn test_single_press_waits_for_settlement() {
        let mut ui = Interaction::new();
        assert!(feed(&mut ui, &[1000]).is_empty());
        assert_eq!(ui.poll(ms(1599)), None);
        assert_eq!(ui.poll(ms(1600)), Some(Action::SinglePress));
        assert_eq!(ui.poll(ms(3000)), None);
        assert_eq!(ui.state(), UiState::Idle);
    }

    #[test]
    fn test_double_press_enters_setup_without_single_press() {
        let mut ui = Interaction::new();
        let actions = feed(&mut ui, &[1000, 1250]);
        assert_eq!(actions.as_slice(), &[Action::EnterFocusSetup]);
        assert_eq!(ui.state(), UiState::FocusSetup);
        assert_eq!(ui.poll(ms(5000)), None);
    }

    #[test]
    fn test_setup_taps_start_timer() {
        for n in 1..=6u32 {
            let mut ui = Interaction::new();
            feed(&mut ui, &[1000, 1200]);
            let presses: heapless::Vec<u64, 8> = (0..n as u64).map(|i| 3000 + i * 300).collect();
            let actions = feed(&mut ui, &presses);
            assert_eq!(actions.last(), Some(&Action::TallyTaps(n)));
            let last = 3000 + (n as u64 - 1) * 300;
            let expected = Duration::from_secs(focus_minutes(n).unwrap() as u64 * 60);
            assert_eq!(ui.poll(ms(last + 600)), Some(Action::StartFocus(expected)));
            assert_eq!(ui.state(), UiState::FocusActive);
            assert_eq!(ui.focus_timer().map(|f| f.minutes), Some(n.min(6) * 20));
        }
    }

    #[test]
    fn test_setup_times_out() {
        let mut ui = Interaction::new();
        feed(&mut ui, &[1000, 1200]);
        assert_eq!(ui.poll(ms(11_199)), None);
        assert_eq!(ui.poll(ms(11_200)), Some(Action::SetupTimedOut));
        assert_eq!(ui.state(), UiState::Idle);
    }

    #[test]
    fn test_double_tap_cancels_focus() {
        let mut ui = Interaction::new();
        feed(&mut ui, &[1000, 1200, 2000]);
        ui.poll(ms(2600));
        assert_eq!(ui.state(), UiState::FocusActive);
        // A lone tap is dropped once it settles
        assert!(feed(&mut ui, &[4000]).is_empty());
        assert_eq!(ui.poll(ms(4600)), None);
        assert_eq!(ui.state(), UiState::FocusActive);
        let actions = feed(&mut ui, &[6000, 6200]);
        assert_eq!(actions.as_slice(), &[Action::CancelFocus]);
        assert_eq!(ui.state(), UiState::Idle);
        assert_eq!(ui.focus_timer(), None);
    }

    #[test]
    fn test_expiry_and_dismiss() {
        let mut ui = Interaction::new();
        assert_eq!(ui.timer_expired(), None);
        feed(&mut ui, &[1000, 1200, 2000]);
        ui.poll(ms(2600));
        assert_eq!(ui.timer_expired(), Some(Action::Alarm));
        assert_eq!(ui.state(), UiState::FocusAlarm);
        assert!(feed(&mut ui, &[9000]).is_empty());
        assert_eq!(ui.poll(ms(9600)), Some(Action::DismissAlarm));
        assert_eq!(ui.state(), UiState::Idle);
    }

    #[test]
    fn test_late_press_settles_previous_burst() {
        let mut ui = Interaction::new();
        let actions = feed(&mut ui, &[1000, 1500]);
        assert_eq!(actions.as_slice(), &[Action::SinglePress]);
        assert_eq!(ui.pending_taps(), 1);
        assert_eq!(ui.poll(ms(2100)), Some(Action::SinglePress));
    }
}
