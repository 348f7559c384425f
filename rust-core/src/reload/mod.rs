//! Reload protocol: receive a curve, design, install on the device

pub mod channel;
pub mod server;
pub mod sink;

pub use channel::{send_spec, ChannelError, ReloadChannel, MAX_MESSAGE_SIZE};
pub use server::{ReloadOutcome, ReloadServer};
pub use sink::{DeviceSink, KernelSink, NullDevice, SinkError};
