//! Audio input/output management with cpal

pub mod buffer;
pub mod device;
pub mod input;
pub mod output;
pub mod processor;

pub use buffer::AudioRingBuffer;
pub use device::LiveDevice;
pub use input::{AudioError, AudioInput};
pub use output::{list_output_devices, AudioOutput};
pub use processor::{AudioProcessor, FilterBank};
