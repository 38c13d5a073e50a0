pub mod device;

pub use device::{
    DeviceChannel, DeviceChannelReceiver, DeviceChannelSender, DeviceCommand, DeviceReply,
    ReplyChannel, ReplyChannelReceiver, ReplyChannelSender, device_task,
};
