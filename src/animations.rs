//! Non-blocking LED ring effects.
//!
//! Exactly one [`Effect`] is live at a time. [`EffectEngine::render`] is called on every tick and
//! draws at most one frame. Each effect owns its refresh interval and phase, so effects do not
//! share a frame rate. The frame maths is exposed as plain functions of time and phase so it can
//! be checked without a ring attached.

use crate::colour::{self, colour_wheel, dim, scale};
use crate::drivers::ring::{DARK, LedBuffer, PixelSink};
use crate::maths::breathe;
use crate::{FOCUS_WIPE, LED_RING_SIZE};
#[cfg(feature = "defmt")]
use defmt::{Format, Formatter, write};
use embassy_time::{Duration, Instant};
use smart_leds::RGB8;

const SPIN_INTERVAL: Duration = Duration::from_millis(80);

const PULSE_INTERVAL: Duration = Duration::from_millis(20);
const PULSE_PERIOD_MS: u64 = 1200;
const PULSE_FLOOR: f32 = 0.15;

const PARTY_INTERVAL: Duration = Duration::from_millis(30);
/// Frames per party phase, about 0.75s at the party frame rate
const PARTY_PHASE_FRAMES: u32 = 25;

const WIPE_INTERVAL: Duration = Duration::from_millis(40);
const WIPE_FILL: RGB8 = RGB8 { r: 16, g: 255, b: 160 };

const COUNTDOWN_INTERVAL: Duration = Duration::from_millis(30);
const COUNTDOWN_PERIOD_MS: u64 = 2000;
const COUNTDOWN_FLOOR: f32 = 0.3;
const COUNTDOWN_COLOUR: RGB8 = RGB8 { r: 30, g: 255, b: 180 };

/// The kinds of effect, without their state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EffectKind {
    Solid,
    Spin,
    Pulse,
    Party,
    FocusStartWipe,
    FocusCountdown,
}

/// Raised by [`EffectEngine::render`] for the state machine to act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineEvent {
    /// The confirmation wipe finished and the countdown has started
    FocusStarted,
    /// The countdown reached the end of the session
    FocusExpired,
}

/// Limits an effect to its own refresh rate. The first frame is always due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameTimer {
    const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Make the next frame due straight away
    fn restart(&mut self) {
        self.last = None;
    }

    fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Outcome of asking an effect for its next frame
enum Step {
    Hold,
    Draw(LedBuffer),
    Handover(FocusCountdown),
    Expired,
}

/// Head at full brightness followed by a two pixel fading trail
pub fn spin_frame(colour: RGB8, head: usize) -> LedBuffer {
    let mut buffer = DARK;
    for (i, pixel) in buffer.iter_mut().enumerate() {
        *pixel = match (head + LED_RING_SIZE - i) % LED_RING_SIZE {
            0 => colour,
            1 => dim(colour, 3),
            2 => dim(colour, 8),
            _ => colour::OFF,
        };
    }
    buffer
}

pub fn pulse_frame(colour: RGB8, now_ms: u64) -> LedBuffer {
    [scale(colour, breathe(now_ms, PULSE_PERIOD_MS, PULSE_FLOOR)); LED_RING_SIZE]
}

/// One party frame. The phase changes every [`PARTY_PHASE_FRAMES`] frames and cycles through
/// a rainbow spin, a strobe, per-pixel shifting hues and a ping-pong bounce.
pub fn party_frame(position: u32) -> LedBuffer {
    let mut buffer = DARK;
    match (position / PARTY_PHASE_FRAMES) % 4 {
        0 => {
            for (i, pixel) in buffer.iter_mut().enumerate() {
                let offset = (i * 256 / LED_RING_SIZE) as u32;
                *pixel = colour_wheel(offset.wrapping_add(position.wrapping_mul(10)) as u8);
            }
        }
        1 => {
            if position % 4 < 2 {
                buffer = [colour_wheel(position.wrapping_mul(37) as u8); LED_RING_SIZE];
            }
        }
        2 => {
            for (i, pixel) in buffer.iter_mut().enumerate() {
                let offset = (i as u32).wrapping_mul(97);
                *pixel = colour_wheel(offset.wrapping_add(position.wrapping_mul(13)) as u8);
            }
        }
        _ => {
            let span = (LED_RING_SIZE * 2 - 2) as u32;
            let mut head = (position % span) as usize;
            if head >= LED_RING_SIZE {
                head = span as usize - head;
            }
            let hue = position.wrapping_mul(8);
            for (i, pixel) in buffer.iter_mut().enumerate() {
                *pixel = match i.abs_diff(head) {
                    0 => colour_wheel(hue as u8),
                    1 => colour_wheel(hue.wrapping_add(80) as u8),
                    _ => colour::OFF,
                };
            }
        }
    }
    buffer
}

/// Pixels fill up in proportion to the elapsed wipe time, with a white searchlight running
/// over the unfilled part
pub fn wipe_frame(elapsed: Duration, trail: usize) -> LedBuffer {
    let lit = (elapsed.as_millis() * LED_RING_SIZE as u64 / FOCUS_WIPE.as_millis()) as usize;
    let mut buffer = DARK;
    for (i, pixel) in buffer.iter_mut().enumerate() {
        if i <= lit {
            *pixel = WIPE_FILL;
        } else if i == trail % LED_RING_SIZE {
            *pixel = colour::WHITE;
        }
    }
    buffer
}

/// Pixels still lit during the countdown. Never below one while the session runs.
pub fn countdown_lit(elapsed: Duration, duration: Duration) -> usize {
    let total = duration.as_millis().max(1);
    let remaining = total.saturating_sub(elapsed.as_millis());
    let lit = (LED_RING_SIZE as u64 * remaining).div_ceil(total) as usize;
    lit.max(1)
}

pub fn countdown_frame(lit: usize, now_ms: u64) -> LedBuffer {
    let colour = scale(
        COUNTDOWN_COLOUR,
        breathe(now_ms, COUNTDOWN_PERIOD_MS, COUNTDOWN_FLOOR),
    );
    let mut buffer = DARK;
    for pixel in buffer.iter_mut().take(lit) {
        *pixel = colour;
    }
    buffer
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinEffect {
    colour: RGB8,
    head: usize,
    timer: FrameTimer,
}

impl SpinEffect {
    pub fn new(colour: RGB8) -> Self {
        Self {
            colour,
            head: 0,
            timer: FrameTimer::new(SPIN_INTERVAL),
        }
    }

    fn step(&mut self, now: Instant) -> Step {
        if !self.timer.ready(now) {
            return Step::Hold;
        }
        let buffer = spin_frame(self.colour, self.head);
        self.head = (self.head + 1) % LED_RING_SIZE;
        Step::Draw(buffer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseEffect {
    colour: RGB8,
    timer: FrameTimer,
}

impl PulseEffect {
    pub fn new(colour: RGB8) -> Self {
        Self {
            colour,
            timer: FrameTimer::new(PULSE_INTERVAL),
        }
    }

    fn step(&mut self, now: Instant) -> Step {
        if !self.timer.ready(now) {
            return Step::Hold;
        }
        Step::Draw(pulse_frame(self.colour, now.as_millis()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyEffect {
    position: u32,
    timer: FrameTimer,
}

impl Default for PartyEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl PartyEffect {
    pub fn new() -> Self {
        Self {
            position: 0,
            timer: FrameTimer::new(PARTY_INTERVAL),
        }
    }

    fn step(&mut self, now: Instant) -> Step {
        if !self.timer.ready(now) {
            return Step::Hold;
        }
        self.position = self.position.wrapping_add(1);
        Step::Draw(party_frame(self.position))
    }
}

/// Five second confirmation before the countdown. Carries the focus duration through to
/// the countdown it hands over to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusWipe {
    started: Instant,
    duration: Duration,
    trail: usize,
    timer: FrameTimer,
}

impl FocusWipe {
    pub fn new(started: Instant, duration: Duration) -> Self {
        Self {
            started,
            duration,
            trail: 0,
            timer: FrameTimer::new(WIPE_INTERVAL),
        }
    }

    fn step(&mut self, now: Instant) -> Step {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= FOCUS_WIPE {
            return Step::Handover(FocusCountdown::new(now, self.duration));
        }
        if !self.timer.ready(now) {
            return Step::Hold;
        }
        let buffer = wipe_frame(elapsed, self.trail);
        self.trail = (self.trail + 1) % LED_RING_SIZE;
        Step::Draw(buffer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusCountdown {
    started: Instant,
    duration: Duration,
    timer: FrameTimer,
}

impl FocusCountdown {
    pub fn new(started: Instant, duration: Duration) -> Self {
        Self {
            started,
            duration,
            timer: FrameTimer::new(COUNTDOWN_INTERVAL),
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn step(&mut self, now: Instant) -> Step {
        if !self.timer.ready(now) {
            return Step::Hold;
        }
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.duration {
            return Step::Expired;
        }
        Step::Draw(countdown_frame(
            countdown_lit(elapsed, self.duration),
            now.as_millis(),
        ))
    }
}

/// Represents the effects that can be rendered on the ring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Drawn once when switched in, no per tick work
    Solid(LedBuffer),
    Spin(SpinEffect),
    Pulse(PulseEffect),
    Party(PartyEffect),
    FocusStartWipe(FocusWipe),
    FocusCountdown(FocusCountdown),
}

impl Effect {
    pub fn solid(colour: RGB8) -> Self {
        Effect::Solid([colour; LED_RING_SIZE])
    }

    /// The first `count` pixels lit in `colour`, the rest off
    pub fn tally(count: u32, colour: RGB8) -> Self {
        let mut buffer = DARK;
        for pixel in buffer.iter_mut().take(count as usize) {
            *pixel = colour;
        }
        Effect::Solid(buffer)
    }

    pub fn spin(colour: RGB8) -> Self {
        Effect::Spin(SpinEffect::new(colour))
    }

    pub fn pulse(colour: RGB8) -> Self {
        Effect::Pulse(PulseEffect::new(colour))
    }

    pub fn party() -> Self {
        Effect::Party(PartyEffect::new())
    }

    /// Confirmation wipe starting at `now`, followed by a countdown of `duration`
    pub fn focus(now: Instant, duration: Duration) -> Self {
        Effect::FocusStartWipe(FocusWipe::new(now, duration))
    }

    pub fn kind(&self) -> EffectKind {
        match self {
            Effect::Solid(_) => EffectKind::Solid,
            Effect::Spin(_) => EffectKind::Spin,
            Effect::Pulse(_) => EffectKind::Pulse,
            Effect::Party(_) => EffectKind::Party,
            Effect::FocusStartWipe(_) => EffectKind::FocusStartWipe,
            Effect::FocusCountdown(_) => EffectKind::FocusCountdown,
        }
    }
}

#[cfg(feature = "defmt")]
impl Format for Effect {
    fn format(&self, fmt: Formatter) {
        match self {
            Effect::Solid(_) => write!(fmt, "Solid"),
            Effect::Spin(_) => write!(fmt, "Spin"),
            Effect::Pulse(_) => write!(fmt, "Pulse"),
            Effect::Party(_) => write!(fmt, "Party"),
            Effect::FocusStartWipe(_) => write!(fmt, "FocusStartWipe"),
            Effect::FocusCountdown(_) => write!(fmt, "FocusCountdown"),
        }
    }
}

/// Holds the live effect. Effects are only ever replaced whole through [`EffectEngine::switch`],
/// never edited between frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectEngine {
    effect: Effect,
}

impl Default for EffectEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectEngine {
    pub const fn new() -> Self {
        Self {
            effect: Effect::Solid(DARK),
        }
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn kind(&self) -> EffectKind {
        self.effect.kind()
    }

    /// Replace the live effect. A solid effect is drawn straight away.
    pub fn switch<P: PixelSink>(&mut self, effect: Effect, ring: &mut P) {
        debug!("EFFECT: {} replaced by {}", self.effect, effect);
        if let Effect::Solid(buffer) = &effect {
            ring.write(buffer);
        }
        self.effect = effect;
    }

    /// Put the live effect back on a ring that something else drew over. Solid effects are
    /// written again, animated ones draw on the next render.
    pub fn redraw<P: PixelSink>(&mut self, ring: &mut P) {
        match &mut self.effect {
            Effect::Solid(buffer) => ring.write(buffer),
            Effect::Spin(s) => s.timer.restart(),
            Effect::Pulse(p) => p.timer.restart(),
            Effect::Party(p) => p.timer.restart(),
            Effect::FocusStartWipe(w) => w.timer.restart(),
            Effect::FocusCountdown(c) => c.timer.restart(),
        }
    }

    /// Draw the next frame of the live effect if one is due
    pub fn render<P: PixelSink>(&mut self, now: Instant, ring: &mut P) -> Option<EngineEvent> {
        let step = match &mut self.effect {
            Effect::Solid(_) => Step::Hold,
            Effect::Spin(s) => s.step(now),
            Effect::Pulse(p) => p.step(now),
            Effect::Party(p) => p.step(now),
            Effect::FocusStartWipe(w) => w.step(now),
            Effect::FocusCountdown(c) => c.step(now),
        };
        match step {
            Step::Hold => None,
            Step::Draw(buffer) => {
                ring.write(&buffer);
                None
            }
            Step::Handover(countdown) => {
                info!("EFFECT: focus countdown of {} started", countdown.duration);
                self.effect = Effect::FocusCountdown(countdown);
                Some(EngineEvent::FocusStarted)
            }
            Step::Expired => Some(EngineEvent::FocusExpired),
        }
    }
}
