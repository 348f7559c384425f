//! Half-window tapers for zero-phase FIR design
//!
//! A symmetric window on (-1, 1) is only ever evaluated for x >= 0, with
//! x = 0 at the kernel center and x = 1 at the kernel edge.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// Raised cosine: w(x) = 0.5 + 0.5*cos(πx)
    /// Mainlobe width: 8π/M, Sidelobe attenuation: ~44 dB
    #[default]
    Hann,

    /// w(x) = 0.54 + 0.46*cos(πx)
    /// Mainlobe width: 8π/M, Sidelobe attenuation: ~53 dB
    Hamming,

    /// w(x) = 0.42 + 0.5*cos(πx) + 0.08*cos(2πx)
    /// Mainlobe width: 12π/M, Sidelobe attenuation: ~74 dB
    Blackman,

    /// No tapering (truncation only)
    Rectangular,
}

impl WindowType {
    /// Evaluate the window at distance `x` from the center.
    ///
    /// # Arguments
    /// * `x` - Normalized distance, 0 at the center and 1 at the edge
    ///
    /// # Returns
    /// Window weight, 1.0 at the center for every window type
    #[inline]
    pub fn taper(&self, x: f64) -> f64 {
        match self {
            WindowType::Hann => 0.5 + 0.5 * (PI * x).cos(),
            WindowType::Hamming => 0.54 + 0.46 * (PI * x).cos(),
            WindowType::Blackman => 0.42 + 0.5 * (PI * x).cos() + 0.08 * (2.0 * PI * x).cos(),
            WindowType::Rectangular => 1.0,
        }
    }

    /// Get approximate stopband attenuation in dB
    pub fn stopband_attenuation_db(&self) -> f64 {
        match self {
            WindowType::Hann => -44.0,
            WindowType::Hamming => -53.0,
            WindowType::Blackman => -74.0,
            WindowType::Rectangular => -21.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WindowType::Hann => "hann",
            WindowType::Hamming => "hamming",
            WindowType::Blackman => "blackman",
            WindowType::Rectangular => "rectangular",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WindowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hann" | "hanning" => Ok(WindowType::Hann),
            "hamming" => Ok(WindowType::Hamming),
            "blackman" => Ok(WindowType::Blackman),
            "rectangular" | "rect" | "none" => Ok(WindowType::Rectangular),
            other => Err(format!(
                "unknown window '{}' (expected hann, hamming, blackman or rectangular)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_taper_endpoints() {
        let w = WindowType::Hann;
        assert!((w.taper(0.0) - 1.0).abs() < 1e-12);
        assert!((w.taper(0.5) - 0.5).abs() < 1e-12);
        assert!(w.taper(1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_tapers_unity_at_center() {
        for w in [
            WindowType::Hann,
            WindowType::Hamming,
            WindowType::Blackman,
            WindowType::Rectangular,
        ] {
            assert!((w.taper(0.0) - 1.0).abs() < 1e-12, "{} center", w);
        }

        // Hamming keeps a pedestal at the edge (0.08)
        let edge = WindowType::Hamming.taper(1.0);
        assert!(edge > 0.07 && edge < 0.09);
        assert!(WindowType::Blackman.taper(1.0).abs() < 1e-12);
    }

    #[test]
    fn test_taper_is_monotonic() {
        for w in [WindowType::Hann, WindowType::Hamming, WindowType::Blackman] {
            let mut prev = w.taper(0.0);
            for i in 1..=100 {
                let next = w.taper(i as f64 / 100.0);
                assert!(next <= prev + 1e-12, "{} rises at step {}", w, i);
                prev = next;
            }
        }
    }

    #[test]
    fn test_parse_window_names() {
        assert_eq!("Hann".parse::<WindowType>(), Ok(WindowType::Hann));
        assert_eq!("blackman".parse::<WindowType>(), Ok(WindowType::Blackman));
        assert_eq!("rect".parse::<WindowType>(), Ok(WindowType::Rectangular));
        assert!("kaiser".parse::<WindowType>().is_err());
    }
}
