use raster_core::models::{ImageIOError, WriterOptions};

use crate::errors::GIFEncoderError;

pub const OPTION_VERSION: &str = "version";
pub const OPTION_LOOP_COUNT: &str = "loop_count";
pub const OPTION_BLOCK_TERMINATOR: &str = "block_terminator";
pub const OPTION_FRAME_DELAY: &str = "frame_delay";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Version {
    Gif87a,
    Gif89a,
}

impl Version {

    pub fn signature(&self) -> &'static [u8; 6] {
        match self {
            Version::Gif87a => b"GIF87a",
            Version::Gif89a => b"GIF89a",
        }
    }

    /// Only 89a containers carry extension blocks (loop control, frame delays).
    pub fn supports_extensions(&self) -> bool {
        *self == Version::Gif89a
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().trim() {
            "87a" | "gif87a" => Some(Version::Gif87a),
            "89a" | "gif89a" => Some(Version::Gif89a),
            _ => None,
        }
    }
}

impl Default for Version {

    fn default() -> Self {
        Version::Gif89a
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EncoderOptions {
    pub version: Version,
    /// How many times an animated container repeats, 0 = forever.
    pub loop_count: u16,
    /// Write an empty sub-block after each frame's data. Most decoders need it to find the end of
    /// the frame.
    pub block_terminator: bool,
    /// Delay between frames in hundredths of a second. Written as a graphic control extension.
    pub frame_delay: Option<u16>,
}

impl Default for EncoderOptions {

    fn default() -> Self {
        EncoderOptions {
            version: Version::Gif89a,
            loop_count: 0,
            block_terminator: true,
            frame_delay: None,
        }
    }
}

impl EncoderOptions {

    pub fn with_version(self, version: Version) -> Self {
        Self { version, ..self }
    }

    pub fn with_loop_count(self, loop_count: u16) -> Self {
        Self { loop_count, ..self }
    }

    pub fn with_block_terminator(self, block_terminator: bool) -> Self {
        Self { block_terminator, ..self }
    }

    pub fn with_frame_delay(self, frame_delay: Option<u16>) -> Self {
        Self { frame_delay, ..self }
    }

    pub fn from_writer_options(options: &WriterOptions) -> Result<Self, GIFEncoderError> {
        let defaults = Self::default();

        let version_name = options.get_str(OPTION_VERSION, "89a");
        let version = Version::parse(version_name).ok_or_else(|| GIFEncoderError::InvalidOptions {
            description: format!("unknown gif version: {}", version_name),
        })?;

        let loop_count = options.get_u32(OPTION_LOOP_COUNT, defaults.loop_count as u32)
            .map_err(invalid_options)
            .and_then(|v| to_u16(OPTION_LOOP_COUNT, v))?;

        let block_terminator = options.get_bool(OPTION_BLOCK_TERMINATOR, defaults.block_terminator)
            .map_err(invalid_options)?;

        let frame_delay = if options.contains(OPTION_FRAME_DELAY) {
            let delay = options.get_u32(OPTION_FRAME_DELAY, 0).map_err(invalid_options)?;
            Some(to_u16(OPTION_FRAME_DELAY, delay)?)
        } else {
            None
        };

        Ok(EncoderOptions {
            version,
            loop_count,
            block_terminator,
            frame_delay,
        })
    }
}

fn invalid_options(err: ImageIOError) -> GIFEncoderError {
    GIFEncoderError::InvalidOptions {
        description: err.to_string(),
    }
}

fn to_u16(key: &str, value: u32) -> Result<u16, GIFEncoderError> {
    if value > u16::MAX as u32 {
        return Err(GIFEncoderError::InvalidOptions {
            description: format!("{} must fit in 16 bits, got {}", key, value),
        });
    }

    Ok(value as u16)
}
