//! Colour parsing shared by the macro `LED` instruction and the remote LED surface, plus the
//! hue wheel used by the party effect.
//!
//! Accepted forms, all case-insensitive and trimmed:
//! - a palette name (`red`, `emerald`, `off`, ...)
//! - `#rrggbb`
//! - `rgb,<r>,<g>,<b>` or `rgb(<r>,<g>,<b>)`, of which only the first three channels are read

use core::fmt;
use smart_leds::RGB8;

pub const OFF: RGB8 = RGB8 { r: 0, g: 0, b: 0 };
pub const RED: RGB8 = RGB8 { r: 255, g: 0, b: 0 };
pub const GREEN: RGB8 = RGB8 { r: 0, g: 255, b: 0 };
pub const WHITE: RGB8 = RGB8 { r: 255, g: 255, b: 255 };
pub const EMERALD: RGB8 = RGB8 { r: 16, g: 185, b: 129 };
/// Shown from the moment the ring is up until the device task runs
pub const BLUE: RGB8 = RGB8 { r: 0, g: 0, b: 255 };

/// Pulsed while waiting for focus duration taps
pub const SKY_BLUE: RGB8 = RGB8 { r: 0, g: 100, b: 255 };

/// Named colours understood by [`parse_colour`]
pub const PALETTE: &[(&str, RGB8)] = &[
    ("red", RED),
    ("green", GREEN),
    ("blue", BLUE),
    ("yellow", RGB8 { r: 255, g: 255, b: 0 }),
    ("magenta", RGB8 { r: 255, g: 0, b: 255 }),
    ("cyan", RGB8 { r: 0, g: 255, b: 255 }),
    ("white", WHITE),
    ("orange", RGB8 { r: 255, g: 165, b: 0 }),
    ("purple", RGB8 { r: 128, g: 0, b: 128 }),
    ("emerald", EMERALD),
    ("off", OFF),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColourError {
    /// Not a palette name and no recognised prefix
    Unknown,
    /// `#` not followed by exactly six hex digits
    BadHex,
    /// A channel that is not an integer in 0..=255
    BadChannel,
    /// Fewer than three channels after the `rgb` prefix
    MissingChannel,
}

impl fmt::Display for ColourError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::Unknown => "unknown colour",
            Self::BadHex => "bad hex colour",
            Self::BadChannel => "bad colour channel",
            Self::MissingChannel => "missing colour channel",
        };
        f.write_str(msg)
    }
}

/// Parse a colour string. Malformed input never produces a partial colour.
pub fn parse_colour(s: &str) -> Result<RGB8, ColourError> {
    let s = s.trim();
    if let Some(&(_, colour)) = PALETTE.iter().find(|(name, _)| name.eq_ignore_ascii_case(s)) {
        return Ok(colour);
    }
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    match s.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("rgb,") => parse_channels(&s[4..]),
        Some(prefix) if prefix.eq_ignore_ascii_case("rgb(") => {
            let inner = s[4..].strip_suffix(')').ok_or(ColourError::BadChannel)?;
            parse_channels(inner)
        }
        _ => Err(ColourError::Unknown),
    }
}

fn parse_hex(hex: &str) -> Result<RGB8, ColourError> {
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColourError::BadHex);
    }
    let v = u32::from_str_radix(hex, 16).map_err(|_| ColourError::BadHex)?;
    Ok(RGB8 {
        r: (v >> 16) as u8,
        g: (v >> 8) as u8,
        b: v as u8,
    })
}

fn parse_channels(list: &str) -> Result<RGB8, ColourError> {
    let mut parts = list.split(',');
    let mut channel = || -> Result<u8, ColourError> {
        let part = parts.next().ok_or(ColourError::MissingChannel)?;
        part.trim().parse::<u8>().map_err(|_| ColourError::BadChannel)
    };
    let r = channel()?;
    let g = channel()?;
    let b = channel()?;
    Ok(RGB8 { r, g, b })
}

/// Map a wheel position to a fully saturated colour. The 256 positions are split into three
/// 85-step segments so the hue runs red, green, blue and back to red.
pub fn colour_wheel(pos: u8) -> RGB8 {
    let pos = 255 - pos;
    if pos < 85 {
        RGB8 { r: 255 - pos * 3, g: 0, b: pos * 3 }
    } else if pos < 170 {
        let pos = pos - 85;
        RGB8 { r: 0, g: pos * 3, b: 255 - pos * 3 }
    } else {
        let pos = pos - 170;
        RGB8 { r: pos * 3, g: 255 - pos * 3, b: 0 }
    }
}

/// Scale every channel by `level`, which is expected to be in `[0.0, 1.0]`
pub fn scale(colour: RGB8, level: f32) -> RGB8 {
    RGB8 {
        r: (colour.r as f32 * level) as u8,
        g: (colour.g as f32 * level) as u8,
        b: (colour.b as f32 * level) as u8,
    }
}

/// Divide every channel by `divisor`, used for the fading spin trail
pub fn dim(colour: RGB8, divisor: u8) -> RGB8 {
    RGB8 {
        r: colour.r / divisor,
        g: colour.g / divisor,
        b: colour.b / divisor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_colour("#34d399"), Ok(RGB8 { r: 52, g: 211, b: 153 }));
        assert_eq!(parse_colour("#34D399"), Ok(RGB8 { r: 52, g: 211, b: 153 }));
        assert_eq!(parse_colour("#34d39"), Err(ColourError::BadHex));
        assert_eq!(parse_colour("#34d39z"), Err(ColourError::BadHex));
    }

    #[test]
    fn test_parse_palette() {
        assert_eq!(parse_colour("emerald"), Ok(RGB8 { r: 16, g: 185, b: 129 }));
        assert_eq!(parse_colour("  GREEN "), Ok(GREEN));
        assert_eq!(parse_colour("off"), Ok(OFF));
        assert_eq!(parse_colour("Blue"), Ok(BLUE));
        assert_eq!(parse_colour("notacolor"), Err(ColourError::Unknown));
    }

    #[test]
    fn test_parse_rgb_forms() {
        assert_eq!(parse_colour("rgb,10,20,30"), Ok(RGB8 { r: 10, g: 20, b: 30 }));
        assert_eq!(parse_colour("RGB,1, 2 ,3"), Ok(RGB8 { r: 1, g: 2, b: 3 }));
        assert_eq!(parse_colour("rgb(10,20,30)"), Ok(RGB8 { r: 10, g: 20, b: 30 }));
        // Anything past the first triple is ignored
        assert_eq!(parse_colour("rgb,1,2,3,4"), Ok(RGB8 { r: 1, g: 2, b: 3 }));
    }

    #[test]
    fn test_parse_rgb_malformed() {
        assert_eq!(parse_colour("rgb,10,20"), Err(ColourError::MissingChannel));
        assert_eq!(parse_colour("rgb,10,x,30"), Err(ColourError::BadChannel));
        assert_eq!(parse_colour("rgb,10,20,300"), Err(ColourError::BadChannel));
        assert_eq!(parse_colour("rgb(10,20,30"), Err(ColourError::BadChannel));
        assert_eq!(parse_colour("rg"), Err(ColourError::Unknown));
    }

    #[test]
    fn test_colour_wheel_segments() {
        assert_eq!(colour_wheel(0), RED);
        assert_eq!(colour_wheel(85), GREEN);
        assert_eq!(colour_wheel(170), RGB8 { r: 0, g: 0, b: 255 });
        assert_eq!(colour_wheel(255), RED);
        // Halfway through the first segment red and green are mixed
        assert_eq!(colour_wheel(42), RGB8 { r: 129, g: 126, b: 0 });
    }

    #[test]
    fn test_dim_and_scale() {
        let c = RGB8 { r: 90, g: 30, b: 240 };
        assert_eq!(dim(c, 3), RGB8 { r: 30, g: 10, b: 80 });
        assert_eq!(scale(c, 0.5), RGB8 { r: 45, g: 15, b: 120 });
        assert_eq!(scale(c, 1.0), c);
    }
}
