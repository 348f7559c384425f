//! Live audio device: capture, filter bank, playback
//!
//! Kernels pushed through [`DeviceSink`] land in the filter bank used by
//! the processing thread.

use super::buffer::AudioRingBuffer;
use super::input::{AudioError, AudioInput};
use super::output::AudioOutput;
use super::processor::{AudioProcessor, BankHandle, ChannelLayout, FilterBank, SharedFilterBank};
use crate::config::EqualizerConfig;
use crate::reload::sink::{DeviceSink, KernelSink, SinkError};
use log::info;
use std::sync::{Arc, Mutex};

/// Seconds of audio each ring buffer can hold
const RING_SECONDS: f64 = 0.5;

pub struct LiveDevice {
    bank: SharedFilterBank,

    // Field order is drop order: streams stop before the processor joins
    _input: AudioInput,
    _output: AudioOutput,
    _processor: AudioProcessor,
}

impl LiveDevice {
    /// Open the default input and the configured output device and start
    /// filtering with a pass-through kernel delayed by `delay` samples
    pub fn start(config: &EqualizerConfig, delay: usize) -> Result<Self, AudioError> {
        let capacity = (config.sample_rate * RING_SECONDS) as usize * config.channels.max(2);
        let (in_prod, in_cons) = AudioRingBuffer::new(capacity).split();
        let (out_prod, out_cons) = AudioRingBuffer::new(capacity).split();

        let input = AudioInput::from_default_device(in_prod, config.sample_rate)?;
        let output = AudioOutput::from_named_device(&config.device, out_cons, config.sample_rate)?;

        let layout = ChannelLayout {
            input: input.device_info().channels as usize,
            output: output.device_info().channels as usize,
        };
        if layout.input == 0 || layout.output == 0 {
            return Err(AudioError::NoDevice(config.device.clone()));
        }

        let bank = Arc::new(Mutex::new(FilterBank::identity(
            config.channels,
            config.block_size,
            delay,
        )));
        let processor = AudioProcessor::spawn(in_cons, out_prod, Arc::clone(&bank), layout);

        input.start()?;
        output.start()?;

        info!(
            "Filtering {} ({} ch) -> {} ({} ch) at {} Hz",
            input.device_info().name,
            layout.input,
            output.device_info().name,
            layout.output,
            output.device_info().sample_rate
        );

        Ok(Self {
            bank,
            _input: input,
            _output: output,
            _processor: processor,
        })
    }
}

impl DeviceSink for LiveDevice {
    fn open(&mut self) -> Result<Box<dyn KernelSink + '_>, SinkError> {
        Ok(Box::new(BankHandle::lock(&self.bank)?))
    }
}
