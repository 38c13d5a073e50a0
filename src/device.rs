//! The whole device as one context value.
//!
//! Everything the firmware used to keep in globals lives in [`Device`]: the debouncer, the UI
//! state machine, the live effect, the macro runner and the auto-off deadline. The tick loop
//! and the remote request handler both go through it, so they are serialised by whoever owns
//! the `Device`.

use crate::animations::{Effect, EffectEngine, EffectKind, EngineEvent};
use crate::colour::{self, EMERALD, SKY_BLUE};
use crate::config::{Settings, SinglePressMode};
use crate::drivers::ring::PixelSink;
use crate::input::{Debouncer, Edge};
use crate::interaction::{Action, Interaction, UiState};
use crate::keyboard::KeyboardSink;
use crate::macros::MacroRunner;
use crate::remote::{LedRequest, LedStatus, RemoteAck, RemoteEffect};
use crate::FACTORY_RESET_HOLD;
use embassy_time::{Duration, Instant};

/// How long the ready indication stays on after boot
const READY_SHOWN: Duration = Duration::from_secs(3);

/// Result of one tick that the firmware has to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    Continue,
    /// The button was held long enough, wipe the settings and restart
    FactoryReset,
}

#[derive(Debug, Clone)]
pub struct Device {
    settings: Settings,
    debouncer: Debouncer,
    ui: Interaction,
    engine: EffectEngine,
    runner: MacroRunner,
    /// Revert the ring to off at this instant
    auto_off: Option<Instant>,
    held_since: Option<Instant>,
    /// The reset already fired for the current hold
    reset_fired: bool,
}

impl Device {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            debouncer: Debouncer::new(),
            ui: Interaction::new(),
            engine: EffectEngine::new(),
            runner: MacroRunner::new(),
            auto_off: None,
            held_since: None,
            reset_fired: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ui_state(&self) -> UiState {
        self.ui.state()
    }

    pub fn effect_kind(&self) -> EffectKind {
        self.engine.kind()
    }

    pub fn is_macro_running(&self) -> bool {
        self.runner.is_running()
    }

    /// Length of the running focus session
    pub fn focus_minutes(&self) -> Option<u32> {
        self.ui.focus_timer().map(|timer| timer.minutes)
    }

    pub fn auto_off(&self) -> Option<Instant> {
        self.auto_off
    }

    pub fn status(&self) -> LedStatus {
        LedStatus::new(self.settings.led_pin())
    }

    /// Show that the device is ready. The ring goes dark again on its own.
    pub fn show_ready<P: PixelSink>(&mut self, now: Instant, ring: &mut P) {
        info!("MAIN: ready");
        self.engine.switch(Effect::solid(colour::GREEN), ring);
        self.auto_off = Some(now + READY_SHOWN);
    }

    /// Advance the device by one tick. `pressed` is the raw button level sampled for this tick.
    pub fn tick<P: PixelSink, K: KeyboardSink>(
        &mut self,
        now: Instant,
        pressed: bool,
        ring: &mut P,
        keyboard: &mut K,
    ) -> TickOutcome {
        self.runner.step(
            self.settings.macro_text(),
            now,
            keyboard,
            &mut self.engine,
            ring,
        );

        if !self.runner.owns_ring() {
            match self.engine.render(now, ring) {
                Some(EngineEvent::FocusExpired) => {
                    if let Some(action) = self.ui.timer_expired() {
                        self.apply(action, now, ring, keyboard);
                    }
                }
                Some(EngineEvent::FocusStarted) | None => {}
            }
        }

        if let Some(deadline) = self.auto_off {
            if now >= deadline {
                debug!("EFFECT: auto-off");
                self.auto_off = None;
                if !matches!(self.ui.state(), UiState::FocusActive | UiState::FocusAlarm) {
                    self.engine.switch(Effect::solid(colour::OFF), ring);
                }
            }
        }

        match self.debouncer.update(pressed, now) {
            Some(Edge::Press) => {
                self.held_since = Some(now);
                self.reset_fired = false;
                if let Some(action) = self.ui.close_burst(now) {
                    self.apply(action, now, ring, keyboard);
                }
                if let Some(action) = self.ui.press(now) {
                    self.apply(action, now, ring, keyboard);
                }
            }
            Some(Edge::Release) => self.held_since = None,
            None => {}
        }

        if let Some(action) = self.ui.poll(now) {
            self.apply(action, now, ring, keyboard);
        }

        self.check_factory_reset(now, ring)
    }

    fn check_factory_reset<P: PixelSink>(&mut self, now: Instant, ring: &mut P) -> TickOutcome {
        let Some(since) = self.held_since else {
            return TickOutcome::Continue;
        };
        if self.reset_fired || now.saturating_duration_since(since) < FACTORY_RESET_HOLD {
            return TickOutcome::Continue;
        }
        warn!("MAIN: factory reset requested");
        self.reset_fired = true;
        self.auto_off = None;
        self.engine.switch(Effect::solid(colour::RED), ring);
        TickOutcome::FactoryReset
    }

    fn apply<P: PixelSink, K: KeyboardSink>(
        &mut self,
        action: Action,
        now: Instant,
        ring: &mut P,
        keyboard: &mut K,
    ) {
        debug!("UI: {}", action);
        match action {
            Action::SinglePress => self.single_press(now, ring, keyboard),
            Action::EnterFocusSetup => {
                self.runner.abort(keyboard);
                self.auto_off = None;
                self.engine.switch(Effect::pulse(SKY_BLUE), ring);
            }
            Action::TallyTaps(count) => self.engine.switch(Effect::tally(count, EMERALD), ring),
            Action::StartFocus(duration) => self.engine.switch(Effect::focus(now, duration), ring),
            Action::Alarm => self.engine.switch(Effect::party(), ring),
            Action::CancelFocus | Action::SetupTimedOut | Action::DismissAlarm => {
                self.engine.switch(Effect::solid(colour::OFF), ring)
            }
        }
    }

    fn single_press<P: PixelSink, K: KeyboardSink>(
        &mut self,
        now: Instant,
        ring: &mut P,
        keyboard: &mut K,
    ) {
        match self.settings.single_press_mode() {
            SinglePressMode::Party => {
                let next = if self.engine.kind() == EffectKind::Party {
                    Effect::solid(colour::OFF)
                } else {
                    Effect::party()
                };
                self.engine.switch(next, ring);
            }
            SinglePressMode::Macro if self.runner.is_running() => {
                debug!("MACRO: already running, press ignored");
            }
            SinglePressMode::Macro => {
                self.runner.start();
                self.runner.step(
                    self.settings.macro_text(),
                    now,
                    keyboard,
                    &mut self.engine,
                    ring,
                );
            }
        }
    }

    /// Apply a remote LED write. A running focus session keeps the ring.
    pub fn led_request<P: PixelSink>(
        &mut self,
        request: &LedRequest,
        now: Instant,
        ring: &mut P,
    ) -> RemoteAck {
        if matches!(self.ui.state(), UiState::FocusActive | UiState::FocusAlarm) {
            info!("REMOTE: focus active, request dropped");
            return RemoteAck::FocusProtected;
        }
        let effect = match request.effect {
            RemoteEffect::Solid => Effect::solid(request.colour),
            RemoteEffect::Spin => Effect::spin(request.colour),
            RemoteEffect::Pulse => Effect::pulse(request.colour),
        };
        self.engine.switch(effect, ring);
        self.auto_off = request.timeout.map(|timeout| now + timeout);
        RemoteAck::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::ring::FrameBuffer;
    use crate::keyboard::Key;

    struct NoKeys;

    impl KeyboardSink for NoKeys {
        fn press(&mut self, _key: Key) {}
        fn release_all(&mut self) {}
        fn print(&mut self, _text: &str) {}
    }

    #[test]
    fn test_ready_indication_turns_off() {
        let mut device = Device::new(Settings::default());
        let mut ring = FrameBuffer::new();
        device.show_ready(Instant::from_millis(100), &mut ring);
        assert_eq!(ring.pixels()[5], colour::GREEN);
        device.tick(Instant::from_millis(3099), false, &mut ring, &mut NoKeys);
        assert_eq!(ring.pixels()[5], colour::GREEN);
        device.tick(Instant::from_millis(3100), false, &mut ring, &mut NoKeys);
        assert_eq!(ring.pixels()[5], colour::OFF);
        assert_eq!(device.auto_off(), None);
    }

    #[test]
    fn test_status_uses_led_pin() {
        let device = Device::new(Settings::default().with_led_pin(7));
        assert_eq!(device.status().pin, 7);
        assert_eq!(device.status().leds, crate::LED_RING_SIZE);
    }
}
