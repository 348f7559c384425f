//! Per-channel FIR filter bank and the processing thread feeding it
//!
//! The bank is shared with the reload path behind a mutex; kernels are
//! swapped between processing blocks, never inside one.

use super::buffer::{AudioConsumer, AudioProducer};
use crate::filters::{FastFirFilter, FirFilter};
use crate::reload::sink::{check_request, KernelSink, SinkError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

/// Longest kernel convolved directly; longer ones use overlap-add
pub const DIRECT_CONVOLUTION_MAX_TAPS: usize = 128;

/// Frames handled per processing step
pub const PROCESS_FRAMES: usize = 256;

/// Streaming filter whose kernel can be replaced while running
pub trait KernelFilter {
    /// Process block in-place (zero allocations)
    fn process_block_inplace(&mut self, buffer: &mut [f64]);
    fn set_kernel(&mut self, taps: &[f64]);
    fn reset(&mut self);
}

impl KernelFilter for FirFilter {
    fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        FirFilter::process_block_inplace(self, buffer)
    }

    fn set_kernel(&mut self, taps: &[f64]) {
        FirFilter::set_kernel(self, taps)
    }

    fn reset(&mut self) {
        FirFilter::reset(self)
    }
}

impl KernelFilter for FastFirFilter {
    fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        FastFirFilter::process_block_inplace(self, buffer)
    }

    fn set_kernel(&mut self, taps: &[f64]) {
        FastFirFilter::set_kernel(self, taps)
    }

    fn reset(&mut self) {
        FastFirFilter::reset(self)
    }
}

/// Pick the convolution strategy for a kernel length
pub fn kernel_filter(taps: &[f64]) -> Box<dyn KernelFilter + Send> {
    if taps.len() > DIRECT_CONVOLUTION_MAX_TAPS {
        Box::new(FastFirFilter::new(taps, PROCESS_FRAMES))
    } else {
        Box::new(FirFilter::new(taps))
    }
}

/// One filter per device channel, all with the same kernel length
pub struct FilterBank {
    filters: Vec<Box<dyn KernelFilter + Send>>,
    kernel_len: usize,
}

impl FilterBank {
    /// Pass-through bank: unit impulse at tap `delay`, which should be the
    /// group delay of the kernels installed later
    pub fn identity(channels: usize, kernel_len: usize, delay: usize) -> Self {
        let mut taps = vec![0.0; kernel_len];
        if let Some(tap) = taps.get_mut(delay) {
            *tap = 1.0;
        }

        Self {
            filters: (0..channels).map(|_| kernel_filter(&taps)).collect(),
            kernel_len,
        }
    }

    pub fn channels(&self) -> usize {
        self.filters.len()
    }

    pub fn kernel_len(&self) -> usize {
        self.kernel_len
    }

    /// Install `taps` on `channel`
    pub fn set_kernel(&mut self, channel: usize, taps: &[f64]) -> Result<(), SinkError> {
        check_request(channel, taps, self.filters.len(), self.kernel_len)?;
        self.filters[channel].set_kernel(taps);
        Ok(())
    }

    /// Filter one channel's samples in place
    pub fn process_channel(&mut self, channel: usize, buffer: &mut [f64]) {
        if let Some(filter) = self.filters.get_mut(channel) {
            filter.process_block_inplace(buffer);
        }
    }

    /// Clear every filter's history
    pub fn reset(&mut self) {
        for filter in self.filters.iter_mut() {
            filter.reset();
        }
    }
}

pub type SharedFilterBank = Arc<Mutex<FilterBank>>;

/// Exclusive access to a shared bank for one round of kernel updates
///
/// The processing thread is held off until the handle drops, so every
/// channel switches kernels at the same block.
pub struct BankHandle<'a> {
    bank: MutexGuard<'a, FilterBank>,
}

impl<'a> BankHandle<'a> {
    pub fn lock(bank: &'a SharedFilterBank) -> Result<Self, SinkError> {
        let bank = bank.lock().map_err(|_| SinkError::Poisoned)?;
        Ok(Self { bank })
    }
}

impl KernelSink for BankHandle<'_> {
    fn apply_kernel(&mut self, channel: usize, taps: &[f64]) -> Result<(), SinkError> {
        self.bank.set_kernel(channel, taps)
    }
}

/// Interleaved channel counts on either side of the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub input: usize,
    pub output: usize,
}

/// Filter `frames` interleaved input frames into interleaved output frames
///
/// Output channel `c` reads input channel `c % layout.input`. Output
/// channels without a filter in the bank stay silent.
pub fn route_block(
    bank: &mut FilterBank,
    layout: ChannelLayout,
    input: &[f64],
    output: &mut [f64],
    scratch: &mut [f64],
) {
    let frames = scratch.len();
    output[..frames * layout.output].fill(0.0);

    for oc in 0..layout.output.min(bank.channels()) {
        let ic = oc % layout.input;
        for (f, s) in scratch.iter_mut().enumerate() {
            *s = input[f * layout.input + ic];
        }
        bank.process_channel(oc, scratch);
        for (f, &s) in scratch.iter().enumerate() {
            output[f * layout.output + oc] = s;
        }
    }
}

/// Background thread moving audio from the input ring through the bank
/// to the output ring
pub struct AudioProcessor {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl AudioProcessor {
    pub fn spawn(
        mut consumer: AudioConsumer,
        mut producer: AudioProducer,
        bank: SharedFilterBank,
        layout: ChannelLayout,
    ) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);

        let thread = std::thread::spawn(move || {
            let mut input = vec![0.0; PROCESS_FRAMES * layout.input];
            let mut output = vec![0.0; PROCESS_FRAMES * layout.output];
            let mut scratch = vec![0.0; PROCESS_FRAMES];

            while flag.load(Ordering::SeqCst) {
                // Whole frames only, so channels never shift
                let frames = (consumer.len() / layout.input).min(PROCESS_FRAMES);
                if frames == 0 {
                    std::thread::sleep(Duration::from_micros(100));
                    continue;
                }

                consumer.read(&mut input[..frames * layout.input]);

                match bank.lock() {
                    Ok(mut bank) => route_block(
                        &mut bank,
                        layout,
                        &input[..frames * layout.input],
                        &mut output,
                        &mut scratch[..frames],
                    ),
                    Err(_) => output.fill(0.0),
                }

                producer.write(&output[..frames * layout.output]);
            }
        });

        Self {
            running,
            thread: Some(thread),
        }
    }

    /// Stop and join the thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AudioProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::AudioRingBuffer;

    #[test]
    fn test_kernel_filter_strategy_matches_direct() {
        let long: Vec<f64> = (0..512).map(|i| 1.0 / (1.0 + i as f64)).collect();
        let mut fast = kernel_filter(&long);
        let mut direct = FirFilter::new(&long);

        let mut a: Vec<f64> = (0..1000).map(|i| ((i * 7) % 13) as f64 - 6.0).collect();
        let mut b = a.clone();
        fast.process_block_inplace(&mut a);
        direct.process_block_inplace(&mut b);

        for i in 0..a.len() {
            assert!((a[i] - b[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_identity_bank_delays_by_half_kernel() {
        let mut bank = FilterBank::identity(1, 8, 4);
        let mut block: Vec<f64> = (1..=12).map(|i| i as f64).collect();
        bank.process_channel(0, &mut block);

        assert!(block[..4].iter().all(|v| v.abs() < 1e-12));
        for i in 4..12 {
            assert!((block[i] - (i - 3) as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_bank_rejects_bad_requests() {
        let mut bank = FilterBank::identity(2, 4, 2);
        assert_eq!(
            bank.set_kernel(2, &[0.0; 4]),
            Err(SinkError::ChannelOutOfRange {
                channel: 2,
                channels: 2
            })
        );
        assert!(matches!(
            bank.set_kernel(0, &[0.0; 3]),
            Err(SinkError::LengthMismatch { .. })
        ));
        assert_eq!(bank.set_kernel(1, &[0.0, 0.0, 2.0, 0.0]), Ok(()));
    }

    #[test]
    fn test_identity_delay_outside_kernel_is_silent() {
        let mut bank = FilterBank::identity(1, 4, 4);
        let mut block = vec![1.0; 8];
        bank.process_channel(0, &mut block);
        assert!(block.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_bank_handle_holds_lock_for_all_channels() {
        let bank: SharedFilterBank = Arc::new(Mutex::new(FilterBank::identity(3, 2, 1)));

        {
            let mut handle = BankHandle::lock(&bank).unwrap();
            for channel in 0..3 {
                handle.apply_kernel(channel, &[0.0, 0.5]).unwrap();
                // Processing cannot slip in between channels
                assert!(bank.try_lock().is_err());
            }
            assert!(handle.apply_kernel(3, &[0.0, 0.5]).is_err());
        }

        let mut bank = bank.try_lock().unwrap();
        for channel in 0..3 {
            let mut block = vec![2.0, 4.0];
            bank.process_channel(channel, &mut block);
            assert_eq!(block, vec![0.0, 1.0]);
        }
    }

    #[test]
    fn test_bank_handle_reports_poisoned_lock() {
        let bank: SharedFilterBank = Arc::new(Mutex::new(FilterBank::identity(1, 2, 1)));
        let poisoner = Arc::clone(&bank);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the bank");
        })
        .join();

        assert!(matches!(BankHandle::lock(&bank), Err(SinkError::Poisoned)));
    }

    #[test]
    fn test_route_block_per_channel_kernels() {
        let mut bank = FilterBank::identity(2, 2, 1);
        // Channel 0: gain 2 with one-sample delay, channel 1: silence
        bank.set_kernel(0, &[0.0, 2.0]).unwrap();
        bank.set_kernel(1, &[0.0, 0.0]).unwrap();

        let layout = ChannelLayout {
            input: 1,
            output: 3,
        };
        let input = [1.0, 2.0, 3.0];
        let mut output = vec![f64::NAN; 9];
        let mut scratch = vec![0.0; 3];
        route_block(&mut bank, layout, &input, &mut output, &mut scratch);

        // Frames of (ch0, ch1, ch2); ch2 has no filter
        assert_eq!(output, vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_processor_thread_moves_audio() {
        let (mut in_prod, in_cons) = AudioRingBuffer::new(4096).split();
        let (out_prod, mut out_cons) = AudioRingBuffer::new(4096).split();
        let bank = Arc::new(Mutex::new(FilterBank::identity(2, 2, 1)));
        bank.lock().unwrap().set_kernel(1, &[0.0, 0.5]).unwrap();

        let mut processor = AudioProcessor::spawn(
            in_cons,
            out_prod,
            Arc::clone(&bank),
            ChannelLayout {
                input: 2,
                output: 2,
            },
        );

        let frames: Vec<f64> = (0..64).flat_map(|i| [i as f64, -(i as f64)]).collect();
        in_prod.write(&frames);

        let mut received = Vec::new();
        let mut chunk = vec![0.0; 128];
        for _ in 0..2000 {
            let n = out_cons.read(&mut chunk);
            received.extend_from_slice(&chunk[..n]);
            if received.len() >= 128 {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        processor.stop();

        assert_eq!(received.len(), 128);
        // Both channels delayed by one frame; channel 1 halved
        for f in 1..64 {
            assert_eq!(received[2 * f], (f - 1) as f64);
            assert_eq!(received[2 * f + 1], -0.5 * (f - 1) as f64);
        }
    }
}
