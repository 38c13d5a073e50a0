#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use esp_hal::{
    Config,
    clock::CpuClock,
    gpio::{Input, InputConfig, Pull},
    rmt::Rmt,
    time::Rate,
    timer::systimer::SystemTimer,
};
use macro_button::{
    LED_BRIGHTNESS, LED_RING_SIZE, colour,
    config::Settings,
    drivers::{button::Button, neopixel::LedDriver},
    tasks::{
        DeviceChannel, DeviceChannelReceiver, DeviceChannelSender, DeviceCommand, DeviceReply,
        ReplyChannel, ReplyChannelReceiver, ReplyChannelSender, device_task,
    },
};
use panic_rtt_target as _;
use static_cell::StaticCell;

/// Remote requests go to the device task through this channel and come back on the reply one
static DEVICE_CHANNEL: StaticCell<DeviceChannel> = StaticCell::new();
static DEVICE_RECEIVER: StaticCell<DeviceChannelReceiver> = StaticCell::new();
static REPLY_CHANNEL: StaticCell<ReplyChannel> = StaticCell::new();
static REPLY_SENDER: StaticCell<ReplyChannelSender> = StaticCell::new();

/// Our LED driver that underlies the device task
static LED_DRIVER: StaticCell<LedDriver> = StaticCell::new();

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

/// Stands in for the HTTP server until one is attached: asks for the LED status once per minute
async fn status_poll(sender: DeviceChannelSender, replies: ReplyChannelReceiver) -> ! {
    loop {
        sender.send(DeviceCommand::Status).await;
        if let DeviceReply::Status(status) = replies.receive().await {
            info!("MAIN: {} LEDs on pin {}", status.leds, status.pin);
        }
        Timer::after(Duration::from_secs(60)).await;
    }
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    rtt_target::rtt_init_defmt!();

    let peripherals = esp_hal::init(Config::default().with_cpu_clock(CpuClock::max()));
    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    // Nothing is persisted yet, every boot starts from the defaults
    let settings = Settings::default();

    let device_channel = DEVICE_CHANNEL.init(Channel::new());
    let sender = device_channel.sender();
    let receiver = DEVICE_RECEIVER.init(device_channel.receiver());
    let reply_channel = REPLY_CHANNEL.init(Channel::new());
    let reply_sender = REPLY_SENDER.init(reply_channel.sender());

    let rmt = Rmt::new(peripherals.RMT, Rate::from_mhz(80))
        .expect("Failed to initialise RMT0")
        .into_async();
    // Pins follow the default settings, the LED on GPIO3 and the button on GPIO0
    let led_driver = LED_DRIVER.init(LedDriver::new(rmt, peripherals.GPIO3, LED_BRIGHTNESS));
    // Blue until the device task takes over the ring
    if let Err(e) = led_driver.write(&[colour::BLUE; LED_RING_SIZE]).await {
        warn!("MAIN: LED write failed: {}", defmt::Debug2Format(&e));
    }
    let button = Button::new(Input::new(
        peripherals.GPIO0,
        InputConfig::default().with_pull(Pull::Up),
    ));

    info!("MAIN: firmware {}", macro_button::FIRMWARE_VERSION);
    spawner
        .spawn(device_task(receiver, reply_sender, led_driver, button, settings))
        .expect("Failed to spawn device task");

    status_poll(sender, reply_channel.receiver()).await
}
