//! The macro language.
//!
//! A program is plain text, one instruction per line. Lines are parsed on their own by
//! [`parse_line`] into an [`Instruction`], and run by a [`MacroRunner`] that is stepped from the
//! tick loop. Waits (`DELAY`, `SPIN` and the short key holds) suspend the runner instead of
//! blocking, so the button and the effects stay live while a macro runs.
//!
//! ```text
//! // comment                     whole line comments and trailing " // comments" are dropped
//! TYPE hello                     keystrokes, no newline
//! PRINT hello                    keystrokes then Enter
//! KEY Enter                      one named key
//! COMBO CTRL+SHIFT+t             modifiers plus a named key or a single character
//! LED emerald | LED RGB,1,2,3    set the ring
//! DELAY 500                      wait, 1..=30000 ms
//! SPIN 2000                      green chase, 1..=30000 ms
//! [CTRL]+[SHIFT]+t               old combo syntax
//! ```
//!
//! Lines that do not parse are skipped and the program carries on.

use crate::animations::{Effect, EffectEngine};
use crate::colour::{self, ColourError, parse_colour};
use crate::drivers::ring::{DARK, LedBuffer, PixelSink};
use crate::keyboard::{Key, KeyboardSink, Modifiers, SpecialKey, literal_key, special_key};
use crate::{LED_RING_SIZE, MACRO_MAX_WAIT};
use core::fmt;
use embassy_time::{Duration, Instant};
use smart_leds::RGB8;

const KEY_HOLD: Duration = Duration::from_millis(30);
const COMBO_HOLD: Duration = Duration::from_millis(50);
const CHASE_INTERVAL: Duration = Duration::from_millis(100);
const CHASE_DIM: RGB8 = RGB8 { r: 0, g: 30, b: 0 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    Type(&'a str),
    Print(&'a str),
    Key(Key),
    /// Also produced by the bracket syntax
    Combo {
        modifiers: Modifiers,
        key: Option<Key>,
    },
    Led(RGB8),
    Delay(Duration),
    Spin(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Empty or comment only, not worth reporting
    Blank,
    UnknownInstruction,
    UnknownKey,
    /// `COMBO` without a `+`
    BadCombo,
    BadColour(ColourError),
    /// Wait outside 1..=30000 ms
    OutOfRange,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => f.write_str("blank line"),
            Self::UnknownInstruction => f.write_str("unknown instruction"),
            Self::UnknownKey => f.write_str("unknown key"),
            Self::BadCombo => f.write_str("combo needs a '+'"),
            Self::BadColour(e) => write!(f, "{e}"),
            Self::OutOfRange => f.write_str("wait out of range"),
        }
    }
}

/// Leading integer of `s`, like a C `atoi`. Anything that does not start with digits is zero.
pub(crate) fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| {
            acc.saturating_mul(10).saturating_add((d - b'0') as i64)
        });
    if negative { -value } else { value }
}

/// Drop comments and surrounding whitespace. A trailing comment needs whitespace before the
/// `//` so text such as `TYPE http://example.com` survives.
pub fn strip_comment(line: &str) -> &str {
    let line = line.trim();
    if line.starts_with("//") {
        return "";
    }
    let cut = line
        .match_indices("//")
        .map(|(i, _)| i)
        .find(|&i| line[..i].ends_with(char::is_whitespace));
    match cut {
        Some(i) => line[..i].trim_end(),
        None => line,
    }
}

fn parse_wait(arg: &str) -> Result<Duration, LineError> {
    let ms = leading_int(arg);
    if ms > 0 && (ms as u64) <= MACRO_MAX_WAIT.as_millis() {
        Ok(Duration::from_millis(ms as u64))
    } else {
        Err(LineError::OutOfRange)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .as_bytes()
        .windows(needle.len())
        .any(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
}

fn parse_combo(combo: &str) -> Result<Instruction<'_>, LineError> {
    let combo = combo.trim();
    let split = match combo.rfind('+') {
        Some(i) if i > 0 => i,
        _ => return Err(LineError::BadCombo),
    };
    let (mods, key) = (&combo[..split], combo[split + 1..].trim());
    let modifiers = Modifiers {
        ctrl: contains_ignore_case(mods, "CTRL"),
        shift: contains_ignore_case(mods, "SHIFT"),
        alt: contains_ignore_case(mods, "ALT"),
        gui: contains_ignore_case(mods, "GUI"),
    };
    let key = special_key(key).or_else(|| literal_key(key));
    Ok(Instruction::Combo { modifiers, key })
}

fn parse_bracket_combo(line: &str) -> Instruction<'_> {
    let modifiers = Modifiers {
        ctrl: line.contains("[CTRL]"),
        shift: line.contains("[SHIFT]"),
        alt: line.contains("[ALT]"),
        gui: line.contains("[GUI]") || line.contains("[CMD]"),
    };
    let key = line
        .rfind('+')
        .map(|i| line[i + 1..].trim().trim_matches(|c: char| c == '[' || c == ']'))
        .and_then(|k| special_key(k).or_else(|| literal_key(k)));
    Instruction::Combo { modifiers, key }
}

/// Parse one program line. Keywords are case-sensitive.
pub fn parse_line(line: &str) -> Result<Instruction<'_>, LineError> {
    let line = strip_comment(line);
    if line.is_empty() {
        return Err(LineError::Blank);
    }
    if let Some(text) = line.strip_prefix("TYPE ") {
        Ok(Instruction::Type(text))
    } else if let Some(text) = line.strip_prefix("PRINT ") {
        Ok(Instruction::Print(text))
    } else if let Some(name) = line.strip_prefix("KEY ") {
        special_key(name)
            .map(Instruction::Key)
            .ok_or(LineError::UnknownKey)
    } else if let Some(combo) = line.strip_prefix("COMBO ") {
        parse_combo(combo)
    } else if let Some(colour) = line.strip_prefix("LED ") {
        parse_colour(colour)
            .map(Instruction::Led)
            .map_err(LineError::BadColour)
    } else if let Some(ms) = line.strip_prefix("DELAY ") {
        parse_wait(ms).map(Instruction::Delay)
    } else if let Some(ms) = line.strip_prefix("SPIN ") {
        parse_wait(ms).map(Instruction::Spin)
    } else if line.starts_with('[') {
        Ok(parse_bracket_combo(line))
    } else {
        Err(LineError::UnknownInstruction)
    }
}

/// Green chase drawn by `SPIN`, distinct from the spin effect
fn chase_frame(head: usize) -> LedBuffer {
    let mut buffer = DARK;
    for (i, pixel) in buffer.iter_mut().enumerate() {
        *pixel = if i == head { colour::GREEN } else { CHASE_DIM };
    }
    buffer
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chase {
    until: Instant,
    head: usize,
    next_frame: Instant,
}

/// What the runner is waiting on before the next line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Delay(Instant),
    /// Keys are down until this instant, then everything is released
    Hold(Instant),
    Spin(Chase),
}

/// Resumable macro execution: a program cursor plus the wait it is suspended on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroRunner {
    /// Byte offset of the next line, `None` when idle
    cursor: Option<usize>,
    wait: Option<Wait>,
}

impl MacroRunner {
    pub const fn new() -> Self {
        Self {
            cursor: None,
            wait: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.cursor.is_some()
    }

    /// True while a `SPIN` chase is drawing, the effect engine must not render meanwhile.
    /// The engine's effect is put back on the ring when the chase ends.
    pub fn owns_ring(&self) -> bool {
        matches!(self.wait, Some(Wait::Spin(_)))
    }

    /// Start from the first line. Nothing runs until the next [`step`](MacroRunner::step).
    pub fn start(&mut self) {
        debug!("MACRO: started");
        self.cursor = Some(0);
        self.wait = None;
    }

    /// Stop the program, releasing any keys it is holding
    pub fn abort<K: KeyboardSink>(&mut self, keyboard: &mut K) {
        if let Some(Wait::Hold(_)) = self.wait {
            keyboard.release_all();
        }
        if self.is_running() {
            debug!("MACRO: aborted");
        }
        *self = Self::new();
    }

    /// Run lines until one has to wait or the program ends. `program` must be the same text
    /// on every step of one run.
    pub fn step<K: KeyboardSink, P: PixelSink>(
        &mut self,
        program: &str,
        now: Instant,
        keyboard: &mut K,
        engine: &mut EffectEngine,
        ring: &mut P,
    ) {
        let Some(mut cursor) = self.cursor else {
            return;
        };
        loop {
            if let Some(wait) = self.wait.as_mut() {
                if !Self::poll_wait(wait, now, keyboard, ring) {
                    self.cursor = Some(cursor);
                    return;
                }
                if let Wait::Spin(_) = wait {
                    engine.redraw(ring);
                }
                self.wait = None;
            }

            let Some(rest) = program.get(cursor..).filter(|r| !r.is_empty()) else {
                debug!("MACRO: finished");
                *self = Self::new();
                return;
            };
            let (line, advance) = match rest.find('\n') {
                Some(end) => (&rest[..end], end + 1),
                None => (rest, rest.len()),
            };
            cursor += advance;

            match parse_line(line) {
                Ok(instruction) => {
                    self.wait = Self::execute(instruction, now, keyboard, engine, ring);
                }
                Err(LineError::Blank) => {}
                Err(e) => debug!("MACRO: skipped line: {}", e),
            }
        }
    }

    /// Returns true once the wait is over
    fn poll_wait<K: KeyboardSink, P: PixelSink>(
        wait: &mut Wait,
        now: Instant,
        keyboard: &mut K,
        ring: &mut P,
    ) -> bool {
        match wait {
            Wait::Delay(until) => now >= *until,
            Wait::Hold(until) => {
                if now < *until {
                    return false;
                }
                keyboard.release_all();
                true
            }
            Wait::Spin(chase) => {
                if now >= chase.until {
                    return true;
                }
                if now >= chase.next_frame {
                    ring.write(&chase_frame(chase.head));
                    chase.head = (chase.head + 1) % LED_RING_SIZE;
                    chase.next_frame = now + CHASE_INTERVAL;
                }
                false
            }
        }
    }

    fn execute<K: KeyboardSink, P: PixelSink>(
        instruction: Instruction<'_>,
        now: Instant,
        keyboard: &mut K,
        engine: &mut EffectEngine,
        ring: &mut P,
    ) -> Option<Wait> {
        match instruction {
            Instruction::Type(text) => {
                keyboard.print(text);
                None
            }
            Instruction::Print(text) => {
                keyboard.print(text);
                keyboard.press(Key::Special(SpecialKey::Enter));
                keyboard.release_all();
                None
            }
            Instruction::Key(key) => {
                keyboard.press(key);
                Some(Wait::Hold(now + KEY_HOLD))
            }
            Instruction::Combo { modifiers, key } => {
                modifiers.press(keyboard);
                if let Some(key) = key {
                    keyboard.press(key);
                }
                Some(Wait::Hold(now + COMBO_HOLD))
            }
            Instruction::Led(colour) => {
                engine.switch(Effect::solid(colour), ring);
                None
            }
            Instruction::Delay(duration) => Some(Wait::Delay(now + duration)),
            Instruction::Spin(duration) => Some(Wait::Spin(Chase {
                until: now + duration,
                head: 0,
                next_frame: now,
            })),
        }
    }
}
