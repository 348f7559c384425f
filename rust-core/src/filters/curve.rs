//! Piecewise-linear frequency response curves
//!
//! A curve is written as whitespace-separated `frequency amplitude` pairs,
//! e.g. `"1000 1.0 2000 0.0 24000 0.0"`. The empty string is the flat
//! unity response.

use std::fmt;
use thiserror::Error;

/// Errors produced while parsing a breakpoint specification
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Malformed pair #{index}: expected two numbers")]
    MalformedPair { index: usize },

    #[error("Nonincreasing sequence of frequencies: pair #{index} has {frequency} Hz after {previous} Hz")]
    NonincreasingFrequency {
        index: usize,
        frequency: f64,
        previous: f64,
    },

    #[error("Negative amplitude {amplitude} in pair #{index}")]
    NegativeAmplitude { index: usize, amplitude: f64 },
}

/// A single control point of the response curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    /// Frequency in Hz
    pub frequency: f64,

    /// Linear amplitude (1.0 = unity gain)
    pub amplitude: f64,
}

/// Continuous piecewise-linear amplitude as a function of frequency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCurve {
    breakpoints: Vec<Breakpoint>,
}

impl ResponseCurve {
    /// Flat unity response
    pub fn flat() -> Self {
        Self::default()
    }

    /// Parse a breakpoint specification
    ///
    /// # Arguments
    /// * `spec` - Whitespace-separated `frequency amplitude` pairs
    ///
    /// # Returns
    /// The curve, or the first error found. Frequencies must be strictly
    /// increasing and start above 0 Hz.
    pub fn parse(spec: &str) -> Result<Self, ParseError> {
        let mut breakpoints = Vec::new();
        let mut previous = 0.0;
        let mut tokens = spec.split_whitespace();

        let mut index = 0;
        while let Some(freq_token) = tokens.next() {
            let frequency = parse_number(freq_token).ok_or(ParseError::MalformedPair { index })?;
            let amplitude = tokens
                .next()
                .and_then(parse_number)
                .ok_or(ParseError::MalformedPair { index })?;

            if frequency <= previous {
                return Err(ParseError::NonincreasingFrequency {
                    index,
                    frequency,
                    previous,
                });
            }
            if amplitude < 0.0 {
                return Err(ParseError::NegativeAmplitude { index, amplitude });
            }

            breakpoints.push(Breakpoint {
                frequency,
                amplitude,
            });
            previous = frequency;
            index += 1;
        }

        Ok(Self { breakpoints })
    }

    /// Amplitude of the curve at frequency `f` (Hz)
    ///
    /// Flat below the first and at/above the last breakpoint. The DC bin
    /// therefore always takes the first breakpoint's amplitude.
    pub fn sample(&self, f: f64) -> f64 {
        let (first, last) = match (self.breakpoints.first(), self.breakpoints.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 1.0,
        };

        if f < first.frequency {
            return first.amplitude;
        }
        if f >= last.frequency {
            return last.amplitude;
        }

        // First breakpoint strictly above f; never 0 and always exists here
        let upper = self.breakpoints.partition_point(|bp| bp.frequency <= f);
        let lo = &self.breakpoints[upper - 1];
        let hi = &self.breakpoints[upper];

        (f - lo.frequency) / (hi.frequency - lo.frequency) * (hi.amplitude - lo.amplitude)
            + lo.amplitude
    }

    pub fn breakpoints(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }
}

impl fmt::Display for ResponseCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, bp) in self.breakpoints.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{} {}", bp.frequency, bp.amplitude)?;
        }
        Ok(())
    }
}

fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}
