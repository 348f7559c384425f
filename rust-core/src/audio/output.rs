//! Audio output playback using cpal

use super::buffer::AudioConsumer;
use super::input::{describe, AudioDeviceInfo, AudioError};
use crate::config::DEFAULT_DEVICE;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream};
use log::error;

/// Audio output stream
pub struct AudioOutput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioOutput {
    /// Play to the output device called `name` (`"default"` for the host default)
    pub fn from_named_device(
        name: &str,
        consumer: AudioConsumer,
        expected_rate: f64,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = if name == DEFAULT_DEVICE {
            host.default_output_device()
        } else {
            host.output_devices()
                .map_err(|e| AudioError::DeviceName(e.to_string()))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
        };
        let device = device.ok_or_else(|| AudioError::NoDevice(name.to_string()))?;

        Self::from_device(device, consumer, expected_rate)
    }

    /// Play to a specific device, draining `consumer`
    pub fn from_device(
        device: Device,
        mut consumer: AudioConsumer,
        expected_rate: f64,
    ) -> Result<Self, AudioError> {
        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;
        let (device_info, stream_config) = describe(&device, config, expected_rate)?;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Underruns play silence
                    consumer.read_f32(data);
                },
                move |err| {
                    error!("Audio output error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::BuildStream(e.to_string()))?;

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start playing audio
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

/// Output devices usable with `--device`, paired with whether each is the
/// host default
pub fn list_output_devices() -> Result<Vec<(AudioDeviceInfo, bool)>, AudioError> {
    let host = cpal::default_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let devices = host
        .output_devices()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?
        .filter_map(|device| {
            let name = device.name().ok()?;
            let config = device.default_output_config().ok()?;
            let is_default = default_name.as_deref() == Some(name.as_str());
            let info = AudioDeviceInfo {
                name,
                sample_rate: config.sample_rate().0,
                channels: config.channels(),
            };
            Some((info, is_default))
        })
        .collect();

    Ok(devices)
}
