//! Audio input capture using cpal
//!
//! Interleaved capture from the default input device

use super::buffer::AudioProducer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use log::error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio device found: {0}")]
    NoDevice(String),

    #[error("Failed to get device name: {0}")]
    DeviceName(String),

    #[error("Failed to get default config: {0}")]
    DefaultConfig(String),

    #[error("Failed to build stream: {0}")]
    BuildStream(String),

    #[error("Failed to play stream: {0}")]
    PlayStream(String),

    #[error("Device runs at {found} Hz but the equalizer is configured for {expected} Hz")]
    UnsupportedSampleRate { found: u32, expected: u32 },
}

/// Audio device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Read name and default config, refusing a sample rate other than `expected_rate`
pub(crate) fn describe(
    device: &Device,
    config: cpal::SupportedStreamConfig,
    expected_rate: f64,
) -> Result<(AudioDeviceInfo, StreamConfig), AudioError> {
    let name = device
        .name()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;

    let sample_rate = config.sample_rate().0;
    if sample_rate as f64 != expected_rate {
        return Err(AudioError::UnsupportedSampleRate {
            found: sample_rate,
            expected: expected_rate as u32,
        });
    }

    let info = AudioDeviceInfo {
        name,
        sample_rate,
        channels: config.channels(),
    };
    Ok((info, config.into()))
}

/// Audio input stream
pub struct AudioInput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioInput {
    /// Capture from the default input device into `producer`
    pub fn from_default_device(producer: AudioProducer, expected_rate: f64) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| AudioError::NoDevice("default input".to_string()))?;

        Self::from_device(device, producer, expected_rate)
    }

    /// Capture from a specific device into `producer`
    pub fn from_device(
        device: Device,
        mut producer: AudioProducer,
        expected_rate: f64,
    ) -> Result<Self, AudioError> {
        let config = device
            .default_input_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;
        let (device_info, stream_config) = describe(&device, config, expected_rate)?;

        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    producer.write_f32(data);
                },
                move |err| {
                    error!("Audio input error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start capturing audio
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Get device information
    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.device_info
    }
}
