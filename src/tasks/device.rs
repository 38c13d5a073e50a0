use crate::config::Settings;
use crate::drivers::{button::Button, keyboard::LogKeyboard, neopixel::LedDriver, FrameBuffer};
use crate::remote::{LedRequest, LedStatus, RemoteAck};
use crate::{Device, TickOutcome};
use embassy_futures::select::{Either, select};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::{Channel, Receiver, Sender},
};
use embassy_time::{Duration, Instant, Ticker};

/// Button sampling and effect update period
const TICK: Duration = Duration::from_millis(5);

/// Requests from the remote surface. Each one is answered with exactly one [`DeviceReply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    Led(LedRequest),
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceReply {
    Led(RemoteAck),
    Status(LedStatus),
}

const COMMAND_QUEUE_SIZE: usize = 4;
/// Channel types for the device task.
pub type DeviceChannel = Channel<CriticalSectionRawMutex, DeviceCommand, COMMAND_QUEUE_SIZE>;
pub type DeviceChannelSender =
    Sender<'static, CriticalSectionRawMutex, DeviceCommand, COMMAND_QUEUE_SIZE>;
pub type DeviceChannelReceiver =
    Receiver<'static, CriticalSectionRawMutex, DeviceCommand, COMMAND_QUEUE_SIZE>;

pub type ReplyChannel = Channel<CriticalSectionRawMutex, DeviceReply, COMMAND_QUEUE_SIZE>;
pub type ReplyChannelSender =
    Sender<'static, CriticalSectionRawMutex, DeviceReply, COMMAND_QUEUE_SIZE>;
pub type ReplyChannelReceiver =
    Receiver<'static, CriticalSectionRawMutex, DeviceReply, COMMAND_QUEUE_SIZE>;

async fn flush(led: &mut LedDriver, ring: &mut FrameBuffer) {
    if let Err(e) = led.flush(ring).await {
        warn!("DEVICE_TASK: LED write failed: {}", defmt::Debug2Format(&e));
    }
}

/// Device main task.
/// Owns the [`Device`] and is the only place it is touched, so the tick loop and remote
/// requests never interleave.
///
/// # Parameters
/// * `commands` - Channel receiver for remote requests
/// * `replies` - Where the answer to each request goes
/// * `led` - LED driver for the ring
/// * `button` - The push button
/// * `settings` - Settings loaded at boot
#[embassy_executor::task]
pub async fn device_task(
    commands: &'static DeviceChannelReceiver,
    replies: &'static ReplyChannelSender,
    led: &'static mut LedDriver,
    button: Button<'static>,
    settings: Settings,
) {
    info!(
        "DEVICE_TASK: started, mode {}, led pin {}, button pin {}",
        settings.single_press_mode(),
        settings.led_pin(),
        settings.button_pin()
    );
    let mut device = Device::new(settings);
    let mut ring = FrameBuffer::new();
    let mut keyboard = LogKeyboard;

    device.show_ready(Instant::now(), &mut ring);
    flush(led, &mut ring).await;

    let mut ticker = Ticker::every(TICK);
    loop {
        match select(ticker.next(), commands.receive()).await {
            Either::First(_) => {
                let outcome =
                    device.tick(Instant::now(), button.is_pressed(), &mut ring, &mut keyboard);
                flush(led, &mut ring).await;
                if outcome == TickOutcome::FactoryReset {
                    warn!("DEVICE_TASK: restarting with default settings");
                    esp_hal::system::software_reset();
                }
            }
            Either::Second(DeviceCommand::Led(request)) => {
                debug!("DEVICE_TASK: {}", request);
                let ack = device.led_request(&request, Instant::now(), &mut ring);
                flush(led, &mut ring).await;
                replies.send(DeviceReply::Led(ack)).await;
            }
            Either::Second(DeviceCommand::Status) => {
                replies.send(DeviceReply::Status(device.status())).await;
            }
        }
    }
}
