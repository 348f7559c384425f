//! Device sink abstraction
//!
//! The reload server only needs to ask a device to apply N taps to a
//! channel. A handle is opened per reload and released when dropped.

use log::debug;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("Cannot open device: {0}")]
    Open(String),

    #[error("Channel {channel} out of range (device has {channels})")]
    ChannelOutOfRange { channel: usize, channels: usize },

    #[error("Cannot set filter for channel {channel}: error {code}")]
    Rejected { channel: usize, code: i32 },

    #[error("Kernel has {found} taps, device expects {expected}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Filter bank lock poisoned")]
    Poisoned,
}

/// An open device accepting kernels
pub trait KernelSink {
    /// Apply FIR `taps` to `channel`
    fn apply_kernel(&mut self, channel: usize, taps: &[f64]) -> Result<(), SinkError>;
}

/// A device that can be opened for one round of kernel updates
pub trait DeviceSink {
    fn open(&mut self) -> Result<Box<dyn KernelSink + '_>, SinkError>;
}

/// Sink without audio hardware: checks and logs every request
pub struct NullDevice {
    channels: usize,
    kernel_len: usize,
}

impl NullDevice {
    pub fn new(channels: usize, kernel_len: usize) -> Self {
        Self {
            channels,
            kernel_len,
        }
    }
}

impl DeviceSink for NullDevice {
    fn open(&mut self) -> Result<Box<dyn KernelSink + '_>, SinkError> {
        Ok(Box::new(NullHandle { device: self }))
    }
}

struct NullHandle<'a> {
    device: &'a NullDevice,
}

impl KernelSink for NullHandle<'_> {
    fn apply_kernel(&mut self, channel: usize, taps: &[f64]) -> Result<(), SinkError> {
        check_request(channel, taps, self.device.channels, self.device.kernel_len)?;
        debug!("null device: {} taps accepted for channel {}", taps.len(), channel);
        Ok(())
    }
}

/// Validate channel index and kernel length against a device's shape
pub fn check_request(
    channel: usize,
    taps: &[f64],
    channels: usize,
    kernel_len: usize,
) -> Result<(), SinkError> {
    if channel >= channels {
        return Err(SinkError::ChannelOutOfRange { channel, channels });
    }
    if taps.len() != kernel_len {
        return Err(SinkError::LengthMismatch {
            expected: kernel_len,
            found: taps.len(),
        });
    }
    Ok(())
}
