//! Response curves, FIR design and streaming convolution

pub mod curve;
pub mod windows;
pub mod design;
pub mod fir;
pub mod fast_fir;

pub use curve::{Breakpoint, ParseError, ResponseCurve};
pub use windows::WindowType;
pub use design::{DesignError, FilterDesign, FilterDesigner};
pub use fir::FirFilter;
pub use fast_fir::FastFirFilter;
