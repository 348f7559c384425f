//! FIR Equalizer - Hot-Reloadable Linear-Phase Equalizer Core
//! 
//! Designs linear-phase FIR kernels from piecewise-linear response curves and
//! installs them on a live audio device whenever a new curve arrives.

pub mod audio;
pub mod config;
pub mod filters;
pub mod reload;
pub mod spectrum;

pub use config::{EqualizerConfig, Verbosity};
pub use filters::{FilterDesigner, ResponseCurve, WindowType};
pub use reload::{DeviceSink, KernelSink, ReloadChannel, ReloadServer};
