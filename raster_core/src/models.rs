pub mod image;
pub mod io;
pub mod pixel;

pub use image::Image;
pub use io::{ImageIOError, ImageWriter, WriterOptions};
pub use pixel::Pixel;
