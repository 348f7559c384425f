//! Linear-phase FIR design from a piecewise-linear response curve
//!
//! # Algorithm
//! 1. Sample the curve at the N/2 + 1 analysis frequencies into a zero-phase
//!    half spectrum
//! 2. Inverse transform to a raw impulse response, even-symmetric around
//!    index 0 (mod N)
//! 3. Taper lags 0..N/2 with the half window, scale by 1/N and store them
//!    as the right half of a kernel centered at N/2
//! 4. Mirror the right half onto the left half
//! 5. Zero the tap farthest from the center (index 0)
//!
//! The forward transform of the finished kernel is kept as a diagnostic.

use super::curve::{ParseError, ResponseCurve};
use super::windows::WindowType;
use crate::spectrum::analysis::{AchievedResponse, BinResponse};
use crate::spectrum::fft::{SpectralTransform, SpectrumBuffer};
use log::debug;
use realfft::FftError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesignError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Block size must be even and at least 2 (got {0})")]
    InvalidBlockSize(usize),

    #[error("Sample rate must be a positive number (got {0})")]
    InvalidSampleRate(f64),

    #[error("Spectral transform failed: {0}")]
    Transform(#[from] FftError),
}

/// Result of one design cycle
#[derive(Debug, Clone)]
pub struct FilterDesign {
    /// Time-domain taps, length N, symmetric about N/2
    pub kernel: Vec<f64>,

    /// Achieved vs requested amplitude per analysis bin
    pub response: AchievedResponse,
}

/// FIR designer with scratch buffers allocated once for its block size
pub struct FilterDesigner {
    sample_rate: f64,
    block_size: usize,
    window_type: WindowType,
    transform: SpectralTransform,
    spectrum: SpectrumBuffer,
    time: Vec<f64>,
}

impl FilterDesigner {
    /// Create a designer
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `block_size` - Kernel length N (even, >= 2), also the transform size
    /// * `window_type` - Taper applied to the raw impulse response
    pub fn new(
        sample_rate: f64,
        block_size: usize,
        window_type: WindowType,
    ) -> Result<Self, DesignError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DesignError::InvalidSampleRate(sample_rate));
        }
        if block_size < 2 || block_size % 2 != 0 {
            return Err(DesignError::InvalidBlockSize(block_size));
        }

        Ok(Self {
            sample_rate,
            block_size,
            window_type,
            transform: SpectralTransform::new(block_size),
            spectrum: SpectrumBuffer::new(block_size),
            time: vec![0.0; block_size],
        })
    }

    /// Parse `spec` and design a kernel for it
    ///
    /// Nothing is transformed when the curve does not parse.
    pub fn design_spec(&mut self, spec: &str) -> Result<FilterDesign, DesignError> {
        let curve = ResponseCurve::parse(spec)?;
        self.design(&curve)
    }

    /// Design a kernel approximating `curve`
    pub fn design(&mut self, curve: &ResponseCurve) -> Result<FilterDesign, DesignError> {
        let n = self.block_size;
        let half = n / 2;

        self.spectrum.clear();
        self.time.fill(0.0);

        for i in 0..=half {
            self.spectrum.set_real(i, curve.sample(self.bin_to_hz(i)));
        }
        let requested = self.spectrum.re().to_vec();

        self.transform.inverse(&self.spectrum, &mut self.time)?;

        // Taper lags 0..N/2 into the right half, centered at N/2
        for i in 0..half {
            let weight = self.window_type.taper(i as f64 / half as f64) / n as f64;
            self.time[half + i] = self.time[i] * weight;
        }
        for i in (1..half).rev() {
            self.time[i] = self.time[n - i];
        }
        self.time[0] = 0.0;

        self.transform.forward(&self.time, &mut self.spectrum)?;

        let bins = requested
            .iter()
            .enumerate()
            .map(|(i, &requested)| BinResponse {
                frequency: self.bin_to_hz(i),
                requested,
                achieved: self.spectrum.magnitude(i),
            })
            .collect();
        let response = AchievedResponse::new(bins, self.sample_rate);

        debug!(
            "Designed {}-tap kernel ({} taper, ~{} dB sidelobes), max deviation {:.2e}",
            n,
            self.window_type,
            self.window_type.stopband_attenuation_db(),
            response.max_abs_error()
        );

        Ok(FilterDesign {
            kernel: self.time.clone(),
            response,
        })
    }

    /// Center frequency of analysis bin `bin` in Hz
    pub fn bin_to_hz(&self, bin: usize) -> f64 {
        self.sample_rate / self.block_size as f64 * bin as f64
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    /// Group delay of every designed kernel, in samples
    pub fn group_delay_samples(&self) -> usize {
        self.block_size / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn designer(n: usize) -> FilterDesigner {
        FilterDesigner::new(48000.0, n, WindowType::Hann).unwrap()
    }

    fn assert_symmetric(kernel: &[f64]) {
        let n = kernel.len();
        let half = n / 2;
        assert_eq!(kernel[0], 0.0);
        for i in 1..half {
            assert_eq!(
                kernel[half + i],
                kernel[half - i],
                "asymmetric at offset {}",
                i
            );
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            FilterDesigner::new(48000.0, 0, WindowType::Hann),
            Err(DesignError::InvalidBlockSize(0))
        ));
        assert!(matches!(
            FilterDesigner::new(48000.0, 1023, WindowType::Hann),
            Err(DesignError::InvalidBlockSize(1023))
        ));
        assert!(matches!(
            FilterDesigner::new(0.0, 2048, WindowType::Hann),
            Err(DesignError::InvalidSampleRate(_))
        ));
        assert!(FilterDesigner::new(f64::NAN, 2048, WindowType::Hann).is_err());
    }

    #[test]
    fn test_flat_response_small_block() {
        let mut d = designer(8);
        let design = d.design_spec("").unwrap();

        assert_eq!(design.kernel.len(), 8);
        assert_symmetric(&design.kernel);

        // Flat unity is a unit impulse at the center tap
        assert!((design.kernel[4] - 1.0).abs() < 1e-12);

        assert_eq!(design.response.bins().len(), 5);
        for b in design.response.bins() {
            assert_eq!(b.requested, 1.0);
            assert!((b.achieved - 1.0).abs() < 1e-9, "{:?}", b);
        }
    }

    #[test]
    fn test_lowpass_response() {
        let mut d = designer(2048);
        let design = d.design_spec("1000 1.0 2000 0.0 24000 0.0").unwrap();

        assert_eq!(design.kernel.len(), 2048);
        assert_symmetric(&design.kernel);

        let r = &design.response;
        assert!((r.nearest(500.0).unwrap().achieved - 1.0).abs() < 1e-6);
        assert!((r.nearest(1500.0).unwrap().achieved - 0.5).abs() < 1e-3);
        for b in r.bins().iter().filter(|b| b.frequency > 2100.0) {
            assert!(b.achieved < 1e-6, "{:.1} Hz leaks {}", b.frequency, b.achieved);
        }

        // The Hann taper smooths the target by at most a fraction of a bin
        assert!(r.max_abs_error() < 0.01);
    }

    #[test]
    fn test_flat_kernel_peaks_at_group_delay() {
        for n in [8, 64, 2048] {
            let mut d = designer(n);
            let kernel = d.design_spec("").unwrap().kernel;
            let peak = kernel
                .iter()
                .enumerate()
                .fold(0, |best, (i, &v)| if v > kernel[best] { i } else { best });
            assert_eq!(peak, d.group_delay_samples());
        }
    }

    #[test]
    fn test_dc_bin_takes_first_amplitude() {
        let mut d = designer(64);
        let design = d.design_spec("3000 0.25 6000 1.0").unwrap();
        let dc = design.response.bins()[0];
        assert_eq!(dc.frequency, 0.0);
        assert_eq!(dc.requested, 0.25);
    }

    #[test]
    fn test_design_is_repeatable() {
        let mut d = designer(512);
        let spec = "100 0.5 800 2.0 5000 1.0 12000 0.1";

        let first = d.design_spec(spec).unwrap();
        d.design_spec("300 4.0").unwrap();
        let second = d.design_spec(spec).unwrap();

        assert_eq!(first.kernel, second.kernel);
    }

    #[test]
    fn test_parse_error_aborts_design() {
        let mut d = designer(16);
        assert!(matches!(d.design_spec("100"), Err(DesignError::Parse(_))));
        assert!(matches!(
            d.design_spec("50 1.0 30 1.0"),
            Err(DesignError::Parse(ParseError::NonincreasingFrequency { .. }))
        ));
    }

    #[test]
    fn test_every_taper_is_symmetric() {
        for w in [
            WindowType::Hann,
            WindowType::Hamming,
            WindowType::Blackman,
            WindowType::Rectangular,
        ] {
            let mut d = FilterDesigner::new(44100.0, 256, w).unwrap();
            let design = d.design_spec("200 2.0 3000 0.5 9000 1.0").unwrap();
            assert_symmetric(&design.kernel);
        }
    }

    #[test]
    fn test_minimum_block_size() {
        let mut d = designer(2);
        let design = d.design_spec("").unwrap();
        assert_eq!(design.kernel.len(), 2);
        assert_eq!(design.kernel[0], 0.0);
        assert!((design.kernel[1] - 1.0).abs() < 1e-12);
    }
}
