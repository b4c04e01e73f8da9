use raster_core::models::{Image, ImageIOError, ImageWriter, WriterOptions};

use crate::{container::GIF, errors::GIFEncoderError, options::EncoderOptions, palette::Palette};

pub const OPTION_PALETTE_SEED: &str = "palette_seed";

/// Writes image sequences as GIF. Uses a fixed palette when one is given, otherwise a palette is
/// clustered from the images themselves.
pub struct GIFWriter {
    palette: Option<Palette>,
}

impl GIFWriter {

    pub fn new(palette: Palette) -> Self {
        GIFWriter {
            palette: Some(palette),
        }
    }

    pub fn with_clustered_palette() -> Self {
        GIFWriter {
            palette: None,
        }
    }

    fn encode(&self, images: &[Image], options: &WriterOptions) -> Result<Vec<u8>, GIFEncoderError> {
        let first = images.first().ok_or_else(|| GIFEncoderError::InvalidOptions {
            description: "at least one image is required".to_string(),
        })?;

        let encoder_options = EncoderOptions::from_writer_options(options)?;

        let palette = match &self.palette {
            Some(palette) => palette.clone(),
            None => {
                let seed = options.get_u32(OPTION_PALETTE_SEED, 0).map_err(|err| GIFEncoderError::InvalidOptions {
                    description: err.to_string(),
                })?;

                info!("clustering palette from {} images", images.len());
                Palette::clustered(images, seed as u64)
            },
        };

        let mut gif = GIF::new(first.width, first.height, palette, encoder_options)?;
        gif.add_frames(images)?;

        info!("encoded {} frames of {}x{}", gif.frame_count(), first.width, first.height);
        gif.to_bytes()
    }
}

impl ImageWriter for GIFWriter {

    fn write(&self, images: &[Image], options: &WriterOptions) -> Result<Vec<u8>, ImageIOError> {
        self.encode(images, options).map_err(|err| ImageIOError::FailedToWrite {
            description: format!("failed to write gif: {}", err),
        })
    }
}
