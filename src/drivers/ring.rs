use crate::LED_RING_SIZE;
use smart_leds::RGB8;

/// Convenience type so we speak the same language when dealing with animations etc.
pub type LedBuffer = [RGB8; LED_RING_SIZE];

/// A ring with every pixel off
pub const DARK: LedBuffer = [RGB8 { r: 0, g: 0, b: 0 }; LED_RING_SIZE];

/// Anything the core can draw the ring onto. Pixels set with [`PixelSink::set`] only become
/// visible on [`PixelSink::show`].
pub trait PixelSink {
    fn set(&mut self, index: usize, colour: RGB8);

    fn show(&mut self);

    /// Replace the whole ring and show it
    fn write(&mut self, buffer: &LedBuffer) {
        for (index, colour) in buffer.iter().enumerate() {
            self.set(index, *colour);
        }
        self.show();
    }
}

/// In-memory ring the tick loop draws into. The async LED driver picks up each shown frame
/// after the tick returns, so a frame is never pushed out half drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: LedBuffer,
    pending: bool,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub const fn new() -> Self {
        Self {
            pixels: DARK,
            pending: false,
        }
    }

    pub fn pixels(&self) -> &LedBuffer {
        &self.pixels
    }

    /// The last shown frame, if it has not been collected yet
    pub fn take(&mut self) -> Option<LedBuffer> {
        if self.pending {
            self.pending = false;
            Some(self.pixels)
        } else {
            None
        }
    }
}

impl PixelSink for FrameBuffer {
    fn set(&mut self, index: usize, colour: RGB8) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = colour;
        }
    }

    fn show(&mut self) {
        self.pending = true;
    }
}
