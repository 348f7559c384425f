//! FFT-based fast convolution for long FIR kernels
//!
//! Overlap-add with frequency-domain multiplication.
//! Complexity: O(N log N) vs O(N*M) for time-domain

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Overlap-add FIR filter for long impulse responses
pub struct FastFirFilter {
    /// Kernel in frequency domain
    h_fft: Vec<Complex<f64>>,

    /// FFT size (power of 2, >= block_size + kernel_len - 1)
    fft_size: usize,

    /// Largest chunk convolved per FFT
    block_size: usize,

    /// Kernel length
    kernel_len: usize,

    /// Convolution tail still owed to upcoming samples (kernel_len - 1)
    overlap: Vec<f64>,

    fft: Arc<dyn Fft<f64>>,
    ifft: Arc<dyn Fft<f64>>,

    /// Reusable buffers
    work: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl FastFirFilter {
    /// Create a filter for `taps`, convolving at most `block_size` samples per FFT
    pub fn new(taps: &[f64], block_size: usize) -> Self {
        let kernel_len = taps.len().max(1);
        let block_size = block_size.max(1);
        let fft_size = (block_size + kernel_len - 1).next_power_of_two();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);
        let scratch_len = fft
            .get_inplace_scratch_len()
            .max(ifft.get_inplace_scratch_len());

        let mut filter = Self {
            h_fft: vec![Complex::new(0.0, 0.0); fft_size],
            fft_size,
            block_size,
            kernel_len,
            overlap: vec![0.0; kernel_len - 1],
            fft,
            ifft,
            work: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        };
        filter.load_kernel(taps);
        filter
    }

    fn load_kernel(&mut self, taps: &[f64]) {
        self.h_fft.fill(Complex::new(0.0, 0.0));
        for (h, &tap) in self.h_fft.iter_mut().zip(taps) {
            *h = Complex::new(tap, 0.0);
        }
        self.fft.process_with_scratch(&mut self.h_fft, &mut self.scratch);
    }

    /// Install a new kernel
    ///
    /// With an unchanged length the pending tail is kept, so the previous
    /// kernel rings out while the new one takes over.
    pub fn set_kernel(&mut self, taps: &[f64]) {
        if taps.len().max(1) == self.kernel_len {
            self.load_kernel(taps);
        } else {
            *self = Self::new(taps, self.block_size);
        }
    }

    /// Filter a block in place (any length)
    pub fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        let block_size = self.block_size;
        for chunk in buffer.chunks_mut(block_size) {
            self.process_chunk(chunk);
        }
    }

    fn process_chunk(&mut self, chunk: &mut [f64]) {
        let n = chunk.len();

        for (w, &x) in self.work.iter_mut().zip(chunk.iter()) {
            *w = Complex::new(x, 0.0);
        }
        for w in self.work[n..].iter_mut() {
            *w = Complex::new(0.0, 0.0);
        }

        self.fft.process_with_scratch(&mut self.work, &mut self.scratch);
        for (w, h) in self.work.iter_mut().zip(self.h_fft.iter()) {
            *w *= *h;
        }
        self.ifft.process_with_scratch(&mut self.work, &mut self.scratch);

        let scale = 1.0 / self.fft_size as f64;
        let tail = self.overlap.len();

        for (i, out) in chunk.iter_mut().enumerate() {
            let carried = if i < tail { self.overlap[i] } else { 0.0 };
            *out = self.work[i].re * scale + carried;
        }

        // Shift the remaining tail forward and add this chunk's spill-over.
        // Reads at n + j are always ahead of the write at j.
        for j in 0..tail {
            let carried = if n + j < tail { self.overlap[n + j] } else { 0.0 };
            self.overlap[j] = self.work[n + j].re * scale + carried;
        }
    }

    /// Clear the pending tail
    pub fn reset(&mut self) {
        self.overlap.fill(0.0);
    }

    pub fn kernel_len(&self) -> usize {
        self.kernel_len
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}
