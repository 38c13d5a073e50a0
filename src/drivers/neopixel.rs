use crate::LED_RING_SIZE;
use crate::drivers::ring::{FrameBuffer, LedBuffer};
use esp_hal::{
    Async,
    gpio::interconnect::PeripheralOutput,
    rmt::{ConstChannelAccess, Rmt, Tx},
};
use esp_hal_smartled::{SmartLedsAdapterAsync, buffer_size_async};
use smart_leds::SmartLedsWriteAsync;

/// We must know what the LED TX buffer size is as a constant for the types involved here
const LED_INTERNAL_BUF_LEN: usize = buffer_size_async(LED_RING_SIZE);

type Adapter = SmartLedsAdapterAsync<ConstChannelAccess<Tx, 0>, LED_INTERNAL_BUF_LEN>;

pub type LedError = <Adapter as SmartLedsWriteAsync>::Error;

/// Holds the state needed to drive the ring
pub struct LedDriver {
    /// Sized to exactly what `SmartLedsAdapterAsync::new()` hands back for our ring
    led: Adapter,
    brightness: u8,
}

impl LedDriver {
    /// Create a new driver for the ring.
    ///
    /// # Parameters
    /// * `rmt` - The RMT peripheral device to use for driving the ring
    /// * `pin` - The GPIO pin the ring's data line is connected to
    /// * `brightness` - Global brightness level from 0 (off) to 255 (max brightness)
    pub fn new<'a>(rmt: Rmt<Async>, pin: impl PeripheralOutput<'a>, brightness: u8) -> Self {
        let channel = rmt.channel0;
        let buffer = [0_u32; LED_INTERNAL_BUF_LEN];
        let led = SmartLedsAdapterAsync::new(channel, pin, buffer);
        Self { led, brightness }
    }

    /// Push a frame out to the ring, applying gamma correction and brightness
    pub async fn write(&mut self, frame: &LedBuffer) -> Result<(), LedError> {
        let corrected =
            smart_leds::brightness(smart_leds::gamma(frame.iter().cloned()), self.brightness);
        self.led.write(corrected).await
    }

    /// Write the frame buffer if the core showed a new frame since the last flush
    pub async fn flush(&mut self, ring: &mut FrameBuffer) -> Result<(), LedError> {
        match ring.take() {
            Some(frame) => self.write(&frame).await,
            None => Ok(()),
        }
    }
}
