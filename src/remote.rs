//! Requests and responses of the remote LED surface.
//!
//! The HTTP server itself is not part of the core. It hands the decoded form parameters of a
//! `POST /led` to [`LedRequest::from_form`], applies the request with
//! [`Device::led_request`](crate::Device::led_request) and sends back the matching body.

use crate::colour::parse_colour;
use crate::macros::leading_int;
use crate::{FIRMWARE_VERSION, LED_RING_SIZE};
use core::fmt;
use embassy_time::Duration;
use heapless::String;
use smart_leds::RGB8;
use ufmt::{uDisplay, uWrite, uwrite};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteEffect {
    #[default]
    Solid,
    Spin,
    Pulse,
}

impl RemoteEffect {
    /// `spin` and `pulse` are recognised, anything else is solid
    pub fn from_name(name: &str) -> Self {
        match name {
            "spin" => RemoteEffect::Spin,
            "pulse" => RemoteEffect::Pulse,
            _ => RemoteEffect::Solid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteError {
    /// `color` was given but did not parse
    BadColour,
    /// Neither `color` nor `r` was given
    MissingColour,
}

impl RemoteError {
    pub fn body(&self) -> &'static str {
        "{\"error\":\"bad color\"}"
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadColour => f.write_str("bad colour"),
            Self::MissingColour => f.write_str("no colour given"),
        }
    }
}

/// One remote write. Colour, effect and timeout are applied together or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedRequest {
    pub colour: RGB8,
    pub effect: RemoteEffect,
    /// Revert to off this long after the request was applied
    pub timeout: Option<Duration>,
}

impl LedRequest {
    pub fn new(colour: RGB8) -> Self {
        Self {
            colour,
            effect: RemoteEffect::Solid,
            timeout: None,
        }
    }

    pub fn with_effect(mut self, effect: RemoteEffect) -> Self {
        self.effect = effect;
        self
    }

    /// Zero or negative means no timeout
    pub fn with_timeout_ms(mut self, ms: i64) -> Self {
        self.timeout = (ms > 0).then(|| Duration::from_millis(ms as u64));
        self
    }

    /// Build a request from form parameters. Empty values count as absent.
    ///
    /// `color` wins over `r`/`g`/`b`. Channel values are read like a C `atoi` and truncated to a
    /// byte.
    pub fn from_form<'a, I>(pairs: I) -> Result<Self, RemoteError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let (mut colour, mut r, mut g, mut b) = (None, None, None, None);
        let (mut effect, mut timeout) = ("", "");
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match key {
                "color" => colour = Some(value),
                "r" => r = Some(value),
                "g" => g = Some(value),
                "b" => b = Some(value),
                "effect" => effect = value,
                "timeout" => timeout = value,
                _ => {}
            }
        }

        let channel = |v: Option<&str>| v.map_or(0, |v| leading_int(v) as u8);
        let colour = match (colour, r) {
            (Some(colour), _) => parse_colour(colour).map_err(|_| RemoteError::BadColour)?,
            (None, Some(_)) => RGB8 {
                r: channel(r),
                g: channel(g),
                b: channel(b),
            },
            (None, None) => return Err(RemoteError::MissingColour),
        };

        Ok(Self::new(colour)
            .with_effect(RemoteEffect::from_name(effect))
            .with_timeout_ms(leading_int(timeout)))
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LedRequest {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "LedRequest {{ colour: ({}, {}, {}), effect: {}, timeout: {} }}",
            self.colour.r,
            self.colour.g,
            self.colour.b,
            self.effect,
            self.timeout
        )
    }
}

/// A request was accepted, though not necessarily applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteAck {
    Applied,
    /// A focus session owns the ring, the request was dropped
    FocusProtected,
}

impl RemoteAck {
    pub fn body(&self) -> &'static str {
        match self {
            RemoteAck::Applied => "{\"ok\":true}",
            RemoteAck::FocusProtected => "{\"ok\":true,\"focus\":true}",
        }
    }
}

/// Body of `GET /led`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedStatus {
    pub leds: usize,
    pub pin: u8,
}

pub type StatusBody = String<96>;

impl LedStatus {
    pub fn new(pin: u8) -> Self {
        Self {
            leds: LED_RING_SIZE,
            pin,
        }
    }

    /// The JSON body, `None` if it would not fit
    pub fn body(&self) -> Option<StatusBody> {
        let mut body = StatusBody::new();
        uwrite!(body, "{}", self).ok()?;
        Some(body)
    }
}

impl uDisplay for LedStatus {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str("{\"firmware\":\"")?;
        f.write_str(FIRMWARE_VERSION)?;
        f.write_str("\",\"leds\":")?;
        uwrite!(f, "{}", self.leds)?;
        f.write_str(",\"pin\":")?;
        uwrite!(f, "{}", self.pin)?;
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour;

    #[test]
    fn test_form_colour_name() {
        let req = LedRequest::from_form([("color", "red"), ("effect", "pulse"), ("timeout", "5000")])
            .unwrap();
        assert_eq!(req.colour, colour::RED);
        assert_eq!(req.effect, RemoteEffect::Pulse);
        assert_eq!(req.timeout, Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_form_channels() {
        let req = LedRequest::from_form([("r", "10"), ("g", "x"), ("b", "300")]).unwrap();
        assert_eq!(req.colour, RGB8 { r: 10, g: 0, b: 44 });
        assert_eq!(req.effect, RemoteEffect::Solid);
        assert_eq!(req.timeout, None);
    }

    #[test]
    fn test_form_colour_wins_over_channels() {
        let req = LedRequest::from_form([("r", "1"), ("color", "#0000ff")]).unwrap();
        assert_eq!(req.colour, RGB8 { r: 0, g: 0, b: 255 });
    }

    #[test]
    fn test_form_errors() {
        assert_eq!(
            LedRequest::from_form([("color", "mauve")]),
            Err(RemoteError::BadColour)
        );
        assert_eq!(
            LedRequest::from_form([("effect", "spin")]),
            Err(RemoteError::MissingColour)
        );
        assert_eq!(
            LedRequest::from_form([("color", ""), ("g", "5")]),
            Err(RemoteError::MissingColour)
        );
        assert_eq!(RemoteError::BadColour.body(), "{\"error\":\"bad color\"}");
    }

    #[test]
    fn test_timeouts() {
        let req = LedRequest::new(colour::WHITE);
        assert_eq!(req.with_timeout_ms(0).timeout, None);
        assert_eq!(req.with_timeout_ms(-20).timeout, None);
        assert_eq!(req.with_timeout_ms(1).timeout, Some(Duration::from_millis(1)));
        assert_eq!(RemoteEffect::from_name("SPIN"), RemoteEffect::Solid);
        assert_eq!(RemoteEffect::from_name("spin"), RemoteEffect::Spin);
    }

    #[test]
    fn test_status_body() {
        let body = LedStatus::new(3).body().unwrap();
        let expected = std::format!("{{\"firmware\":\"{FIRMWARE_VERSION}\",\"leds\":6,\"pin\":3}}");
        assert_eq!(body.as_str(), expected);
        assert_eq!(RemoteAck::FocusProtected.body(), "{\"ok\":true,\"focus\":true}");
    }
}
