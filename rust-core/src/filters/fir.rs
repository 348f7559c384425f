//! Direct-form FIR convolution for short kernels
//!
//! Zero-allocation ring buffer delay line. Kernels can be swapped while
//! running; the delay line survives a swap to a kernel of the same length.

/// Streaming FIR filter
pub struct FirFilter {
    /// Kernel taps h[n]
    taps: Vec<f64>,

    /// Delay line holding the last `taps.len()` input samples
    history: Vec<f64>,

    /// Current write position in the delay line
    cursor: usize,
}

impl FirFilter {
    /// Create a filter from kernel taps h[n] for n = 0..M-1
    pub fn new(taps: &[f64]) -> Self {
        Self {
            taps: taps.to_vec(),
            history: vec![0.0; taps.len().max(1)],
            cursor: 0,
        }
    }

    /// Install a new kernel
    ///
    /// The delay line is kept when the length is unchanged so the output
    /// continues without a gap; otherwise it is resized and cleared.
    pub fn set_kernel(&mut self, taps: &[f64]) {
        if taps.len() == self.taps.len() {
            self.taps.copy_from_slice(taps);
        } else {
            self.taps = taps.to_vec();
            self.history = vec![0.0; taps.len().max(1)];
            self.cursor = 0;
        }
    }

    /// Process single sample
    #[inline]
    pub fn process_sample(&mut self, input: f64) -> f64 {
        let len = self.history.len();
        self.history[self.cursor] = input;

        // y[n] = Σ h[k] * x[n-k]
        let mut output = 0.0;
        for (k, &coeff) in self.taps.iter().enumerate() {
            let idx = (self.cursor + len - k) % len;
            output += coeff * self.history[idx];
        }

        self.cursor = (self.cursor + 1) % len;
        output
    }

    /// Filter a block in place
    pub fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Clear the delay line
    pub fn reset(&mut self) {
        self.history.fill(0.0);
        self.cursor = 0;
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Kernel length
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fir_filter_basic() {
        // 3-tap moving average
        let mut filter = FirFilter::new(&[1.0 / 3.0; 3]);

        let output1 = filter.process_sample(3.0);
        let output2 = filter.process_sample(0.0);
        let output3 = filter.process_sample(0.0);
        let output4 = filter.process_sample(0.0);

        assert!((output1 - 1.0).abs() < 1e-10);
        assert!((output2 - 1.0).abs() < 1e-10);
        assert!((output3 - 1.0).abs() < 1e-10);
        assert!(output4.abs() < 1e-10);
    }

    #[test]
    fn test_centered_impulse_delays() {
        // Unit impulse at tap 2 is a pure 2-sample delay
        let mut filter = FirFilter::new(&[0.0, 0.0, 1.0, 0.0]);
        let mut block = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        filter.process_block_inplace(&mut block);
        assert_eq!(block, vec![0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_set_kernel_keeps_history() {
        let mut filter = FirFilter::new(&[1.0, 0.0]);

        let output1 = filter.process_sample(1.0);
        assert!((output1 - 1.0).abs() < 1e-10);

        filter.set_kernel(&[0.0, 1.0]);

        // Previous input (1.0) is still in the delay line
        let output2 = filter.process_sample(2.0);
        assert!((output2 - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_set_kernel_new_length_clears() {
        let mut filter = FirFilter::new(&[0.0, 1.0]);
        filter.process_sample(5.0);

        filter.set_kernel(&[0.0, 0.0, 1.0]);
        assert_eq!(filter.len(), 3);
        assert_eq!(filter.process_sample(1.0), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut filter = FirFilter::new(&[1.0, 1.0]);
        filter.process_sample(1.0);
        filter.process_sample(2.0);

        filter.reset();

        let output = filter.process_sample(1.0);
        assert!((output - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_ring_buffer_wraparound() {
        let mut filter = FirFilter::new(&[1.0, 0.0, 0.0, 1.0]);

        filter.process_sample(1.0);
        filter.process_sample(2.0);
        filter.process_sample(3.0);
        filter.process_sample(4.0);

        // h[0]*5 + h[3]*2
        let output = filter.process_sample(5.0);
        assert!((output - 7.0).abs() < 1e-10);
    }
}
