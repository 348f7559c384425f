//! Process-wide equalizer configuration
//!
//! Built once at startup and never re-read.

use crate::filters::design::{DesignError, FilterDesigner};
use crate::filters::windows::WindowType;
use log::LevelFilter;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;
pub const DEFAULT_BLOCK_SIZE: usize = 2048;
pub const DEFAULT_CHANNELS: usize = 2;
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/equalizer.socket";
pub const DEFAULT_DEVICE: &str = "default";

/// Device name selecting the logging-only sink instead of real audio
pub const NULL_DEVICE: &str = "none";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Wrong sample rate {0} (must be a positive number of Hz)")]
    InvalidSampleRate(f64),

    #[error("Wrong block size {0} (must be even and at least 2)")]
    InvalidBlockSize(usize),

    #[error("Wrong number of channels {0}")]
    InvalidChannels(usize),

    #[error("Reload socket path is empty")]
    EmptySocketPath,
}

/// How much the reload loop reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Nothing at all (detached operation)
    Silent,
    /// Reloads, rejections and device failures
    #[default]
    Normal,
    /// Additionally the per-bin response table and the taps
    Detailed,
}

impl Verbosity {
    pub fn from_flags(silent: bool, verbose: u8) -> Self {
        match (silent, verbose) {
            (true, _) => Verbosity::Silent,
            (false, 0) => Verbosity::Normal,
            (false, _) => Verbosity::Detailed,
        }
    }

    /// Whether reloads and failures are reported
    pub fn reports(self) -> bool {
        self != Verbosity::Silent
    }

    /// Whether the achieved response is reported
    pub fn details(self) -> bool {
        self == Verbosity::Detailed
    }

    /// Matching global logger level
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Silent => LevelFilter::Off,
            Verbosity::Normal => LevelFilter::Info,
            Verbosity::Detailed => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EqualizerConfig {
    /// Sample rate in Hz
    pub sample_rate: f64,

    /// Kernel length N (even)
    pub block_size: usize,

    /// Number of device channels receiving the kernel
    pub channels: usize,

    /// Output device name, `"default"` or `"none"`
    pub device: String,

    /// Path of the reload datagram socket
    pub socket_path: PathBuf,

    /// Taper used by the designer
    pub window_type: WindowType,

    pub verbosity: Verbosity,
}

impl Default for EqualizerConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            channels: DEFAULT_CHANNELS,
            device: DEFAULT_DEVICE.to_string(),
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            window_type: WindowType::default(),
            verbosity: Verbosity::default(),
        }
    }
}

impl EqualizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.block_size < 2 || self.block_size % 2 != 0 {
            return Err(ConfigError::InvalidBlockSize(self.block_size));
        }
        if self.channels == 0 {
            return Err(ConfigError::InvalidChannels(self.channels));
        }
        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptySocketPath);
        }
        Ok(())
    }

    pub fn uses_null_device(&self) -> bool {
        self.device == NULL_DEVICE
    }

    /// Designer sized for this configuration
    pub fn designer(&self) -> Result<FilterDesigner, DesignError> {
        FilterDesigner::new(self.sample_rate, self.block_size, self.window_type)
    }
}
