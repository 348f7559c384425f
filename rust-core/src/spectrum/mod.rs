//! Real spectral transforms and response diagnostics

pub mod fft;
pub mod analysis;

pub use fft::{SpectralTransform, SpectrumBuffer};
pub use analysis::{AchievedResponse, BinResponse};
