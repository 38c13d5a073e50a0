#[cfg(feature = "esp32c3")]
pub mod button;
#[cfg(feature = "esp32c3")]
pub mod keyboard;
#[cfg(feature = "esp32c3")]
pub mod neopixel;
pub mod ring;

pub use ring::{FrameBuffer, LedBuffer, PixelSink};
