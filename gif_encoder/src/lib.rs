#[macro_use]
extern crate log;
extern crate custom_error;

pub mod bits;
pub mod container;
pub mod dictionary;
pub mod errors;
pub mod frame;
pub mod options;
pub mod palette;
pub mod writer;

mod clustering;

#[cfg(test)]
mod testing;

pub use container::{Canvas, ContainerWriter, WriterState, GIF};
pub use errors::{CanvasError, GIFEncoderError, PaletteError};
pub use frame::{Frame, FrameEncoder};
pub use options::{EncoderOptions, Version};
pub use palette::Palette;
pub use writer::GIFWriter;
