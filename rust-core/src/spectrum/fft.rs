//! Real-valued forward/inverse transform pair using realfft
//!
//! The half spectrum of a length-N real signal is kept as two explicit
//! arrays (real and imaginary part, N/2 + 1 bins each). Conversion to the
//! complex layout realfft expects happens only at the transform boundary.

use num_complex::Complex64;
use realfft::{ComplexToReal, FftError, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Non-redundant half of the spectrum of a real signal
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumBuffer {
    re: Vec<f64>,
    im: Vec<f64>,
}

impl SpectrumBuffer {
    /// Create a zeroed spectrum for a block of `block_size` samples
    pub fn new(block_size: usize) -> Self {
        let bins = block_size / 2 + 1;
        Self {
            re: vec![0.0; bins],
            im: vec![0.0; bins],
        }
    }

    /// Zero every bin
    pub fn clear(&mut self) {
        self.re.fill(0.0);
        self.im.fill(0.0);
    }

    /// Number of bins (block_size/2 + 1)
    pub fn bins(&self) -> usize {
        self.re.len()
    }

    /// Set bin `i` to a purely real (zero-phase) value
    #[inline]
    pub fn set_real(&mut self, i: usize, value: f64) {
        self.re[i] = value;
        self.im[i] = 0.0;
    }

    pub fn re(&self) -> &[f64] {
        &self.re
    }

    /// Magnitude of bin `i`
    ///
    /// DC and Nyquist carry no imaginary part for a real signal, so only the
    /// real component counts there.
    pub fn magnitude(&self, i: usize) -> f64 {
        let last = self.bins() - 1;
        let im = if i > 0 && i < last { self.im[i] } else { 0.0 };
        (self.re[i] * self.re[i] + im * im).sqrt()
    }

    /// Write the bins into a complex slice for the inverse transform
    fn pack_into(&self, out: &mut [Complex64]) {
        let last = self.bins() - 1;
        for (i, c) in out.iter_mut().enumerate() {
            let im = if i > 0 && i < last { self.im[i] } else { 0.0 };
            *c = Complex64::new(self.re[i], im);
        }
    }

    /// Read the bins back from a forward transform result
    fn unpack_from(&mut self, input: &[Complex64]) {
        for (i, c) in input.iter().enumerate() {
            self.re[i] = c.re;
            self.im[i] = c.im;
        }
    }
}

/// Unnormalized real DFT pair of a fixed size
///
/// `inverse(forward(x)) == N * x`, matching the usual FFT conventions.
pub struct SpectralTransform {
    /// Transform size (number of time-domain samples)
    size: usize,

    /// Real-to-complex processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Complex-to-real processor
    c2r: Arc<dyn ComplexToReal<f64>>,

    /// realfft consumes its input, so both directions work on copies
    complex_scratch: Vec<Complex64>,
    real_scratch: Vec<f64>,
}

impl SpectralTransform {
    /// Plan both directions for `size` samples
    pub fn new(size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(size);
        let c2r = planner.plan_fft_inverse(size);

        Self {
            size,
            r2c,
            c2r,
            complex_scratch: vec![Complex64::new(0.0, 0.0); size / 2 + 1],
            real_scratch: vec![0.0; size],
        }
    }

    /// Time-domain signal of a half spectrum (no 1/N scaling)
    pub fn inverse(&mut self, spectrum: &SpectrumBuffer, time: &mut [f64]) -> Result<(), FftError> {
        spectrum.pack_into(&mut self.complex_scratch);
        self.c2r.process(&mut self.complex_scratch, time)
    }

    /// Half spectrum of a time-domain signal (no scaling)
    pub fn forward(&mut self, time: &[f64], spectrum: &mut SpectrumBuffer) -> Result<(), FftError> {
        self.real_scratch.copy_from_slice(time);
        self.r2c
            .process(&mut self.real_scratch, &mut self.complex_scratch)?;
        spectrum.unpack_from(&self.complex_scratch);
        Ok(())
    }

    /// Get transform size
    pub fn size(&self) -> usize {
        self.size
    }
}
