use std::{fs::File, io::{BufWriter, Write}, path::Path};

use byteorder::{ByteOrder, LittleEndian};
use rayon::prelude::*;

use raster_core::models::{Image, Pixel};

use crate::{
    errors::{CanvasError, GIFEncoderError},
    frame::Frame,
    options::{EncoderOptions, Version},
    palette::{Palette, PALETTE_SIZE},
};

pub const EXTENSION_INTRODUCER: u8 = 0x21;
pub const APPLICATION_EXTENSION_LABEL: u8 = 0xFF;
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
pub const TRAILER: u8 = 0x3B;

const GLOBAL_COLOR_TABLE_FLAG: u8 = 0b1000_0000;
const COLOR_RESOLUTION: u8 = 0b0111_0000; // 8 bits per primary color

/// Width and height shared by the container and all of its frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u16,
    height: u16,
}

impl Canvas {

    pub fn new(width: usize, height: usize) -> Result<Self, CanvasError> {
        if width == 0 || height == 0 || width > u16::MAX as usize || height > u16::MAX as usize {
            return Err(CanvasError::InvalidDimensions {
                width,
                height,
            });
        }

        Ok(Canvas {
            width: width as u16,
            height: height as u16,
        })
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// The image has the canvas dimensions and holds exactly one pixel per position.
    pub fn fits(&self, image: &Image) -> bool {
        image.width == self.width as usize
            && image.height == self.height as usize
            && image.pixels.len() == image.width * image.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterState {
    Uninitialized,
    HeaderWritten,
    ScreenDescriptorWritten,
    ColorTableWritten,
    LoopExtensionWritten,
    FrameWritten,
    Finalized,
}

/// Writes container sections to a byte sink, strictly in format order:
/// header, screen descriptor, global color table, optional loop extension, frames, trailer.
///
/// Calling a section out of order or writing anything after `finish` is a programming error and
/// panics.
pub struct ContainerWriter<W: Write> {
    writer: W,
    canvas: Canvas,
    state: WriterState,
    block_terminator: bool,
    bytes_written: usize,
}

impl<W: Write> ContainerWriter<W> {

    pub fn new(writer: W, canvas: Canvas, block_terminator: bool) -> Self {
        ContainerWriter {
            writer,
            canvas,
            state: WriterState::Uninitialized,
            block_terminator,
            bytes_written: 0,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    pub fn write_header(&mut self, version: Version) -> Result<(), GIFEncoderError> {
        self.advance(&[WriterState::Uninitialized], WriterState::HeaderWritten);
        self.write(version.signature())
    }

    pub fn write_screen_descriptor(&mut self) -> Result<(), GIFEncoderError> {
        self.advance(&[WriterState::HeaderWritten], WriterState::ScreenDescriptorWritten);

        let mut data = [0u8; 7];
        LittleEndian::write_u16(&mut data[0..2], self.canvas.width);
        LittleEndian::write_u16(&mut data[2..4], self.canvas.height);

        // color table holds 2^(size + 1) entries, not sorted
        let size_of_global_color_table = (PALETTE_SIZE.trailing_zeros() - 1) as u8;
        data[4] = GLOBAL_COLOR_TABLE_FLAG | COLOR_RESOLUTION | size_of_global_color_table;

        data[5] = 0; // background color index
        data[6] = 0; // pixel aspect ratio

        self.write(&data)
    }

    pub fn write_color_table(&mut self, palette: &Palette) -> Result<(), GIFEncoderError> {
        self.advance(&[WriterState::ScreenDescriptorWritten], WriterState::ColorTableWritten);
        assert_eq!(palette.len(), PALETTE_SIZE);

        self.write(&palette.to_bytes())
    }

    /// NETSCAPE2.0 application extension.
    pub fn write_loop_extension(&mut self, loop_count: u16) -> Result<(), GIFEncoderError> {
        self.advance(&[WriterState::ColorTableWritten], WriterState::LoopExtensionWritten);

        let mut data = [0u8; 19];
        data[0] = EXTENSION_INTRODUCER;
        data[1] = APPLICATION_EXTENSION_LABEL;
        data[2] = 11; // length of the application identifier
        data[3..14].copy_from_slice(b"NETSCAPE2.0");
        data[14] = 3; // length of the sub-block that follows
        data[15] = 1;
        LittleEndian::write_u16(&mut data[16..18], loop_count);
        data[18] = 0;

        debug!("loop extension added, loop count = {}", loop_count);

        self.write(&data)
    }

    /// Writes one frame, optionally preceded by a graphic control extension with its delay.
    pub fn write_frame(&mut self, frame: &Frame, delay: Option<u16>) -> Result<(), GIFEncoderError> {
        self.advance(&[
            WriterState::ColorTableWritten,
            WriterState::LoopExtensionWritten,
            WriterState::FrameWritten,
        ], WriterState::FrameWritten);
        assert!(
            frame.width() == self.canvas.width && frame.height() == self.canvas.height,
            "frame does not match the canvas"
        );

        if let Some(delay) = delay {
            let mut data = [0u8; 8];
            data[0] = EXTENSION_INTRODUCER;
            data[1] = GRAPHIC_CONTROL_LABEL;
            data[2] = 4; // block size
            data[3] = 0; // no disposal method, no transparency
            LittleEndian::write_u16(&mut data[4..6], delay);
            data[6] = 0; // transparent color index
            data[7] = 0;

            self.write(&data)?;
        }

        self.write(&frame.descriptor())?;
        self.write(&[frame.min_code_size()])?;
        self.write(frame.blocks())?;

        if self.block_terminator {
            self.write(&[0])?;
        }

        Ok(())
    }

    /// Writes the trailer and hands back the sink.
    pub fn finish(mut self) -> Result<W, GIFEncoderError> {
        self.advance(&[
            WriterState::ColorTableWritten,
            WriterState::LoopExtensionWritten,
            WriterState::FrameWritten,
        ], WriterState::Finalized);

        self.write(&[TRAILER])?;
        self.writer.flush()?;

        trace!("container finalized, {} bytes written", self.bytes_written);

        Ok(self.writer)
    }

    fn advance(&mut self, allowed: &[WriterState], next: WriterState) {
        assert!(allowed.contains(&self.state), "cannot move from {:?} to {:?}", self.state, next);
        self.state = next;
    }

    fn write(&mut self, data: &[u8]) -> Result<(), GIFEncoderError> {
        self.writer.write_all(data)?;
        self.bytes_written += data.len();
        Ok(())
    }
}

/// An image sequence sharing one canvas and one global palette. Frames are compressed as they are
/// added and written out in insertion order.
pub struct GIF {
    canvas: Canvas,
    palette: Palette,
    options: EncoderOptions,
    frames: Vec<Frame>,
}

impl GIF {

    pub fn new(width: usize, height: usize, palette: Palette, options: EncoderOptions) -> Result<Self, GIFEncoderError> {
        Ok(GIF {
            canvas: Canvas::new(width, height)?,
            palette,
            options,
            frames: Vec::new(),
        })
    }

    pub fn from_colors(width: usize, height: usize, colors: Vec<Pixel>, options: EncoderOptions) -> Result<Self, GIFEncoderError> {
        let palette = Palette::new(colors)?;
        Self::new(width, height, palette, options)
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Appends a frame. A frame of the wrong size is rejected and the container stays unchanged.
    pub fn add_frame(&mut self, image: &Image) -> Result<(), GIFEncoderError> {
        self.check_frame_size(image)?;

        self.frames.push(Frame::encode(image, &self.palette));
        Ok(())
    }

    /// Appends several frames, compressing them in parallel. Either all frames are added, in the
    /// given order, or none of them.
    pub fn add_frames(&mut self, images: &[Image]) -> Result<(), GIFEncoderError> {
        for image in images {
            self.check_frame_size(image)?;
        }

        let palette = &self.palette;
        let frames: Vec<Frame> = images.par_iter()
            .map(|image| Frame::encode(image, palette))
            .collect();

        self.frames.extend(frames);
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<W, GIFEncoderError> {
        let version = self.options.version;
        let mut container = ContainerWriter::new(writer, self.canvas, self.options.block_terminator);

        container.write_header(version)?;
        container.write_screen_descriptor()?;
        container.write_color_table(&self.palette)?;

        if version.supports_extensions() {
            container.write_loop_extension(self.options.loop_count)?;
        }

        let delay = if version.supports_extensions() {
            self.options.frame_delay
        } else {
            None
        };

        for frame in &self.frames {
            container.write_frame(frame, delay)?;
        }

        container.finish()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, GIFEncoderError> {
        self.write_to(Vec::new())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GIFEncoderError> {
        let file = File::create(path.as_ref())?;
        self.write_to(BufWriter::new(file))?;

        info!("saved {} frames to {}", self.frames.len(), path.as_ref().display());
        Ok(())
    }

    fn check_frame_size(&self, image: &Image) -> Result<(), GIFEncoderError> {
        if self.canvas.fits(image) {
            return Ok(());
        }

        Err(GIFEncoderError::FrameSizeMismatch {
            width: image.width,
            height: image.height,
            expected_width: self.canvas.width as usize,
            expected_height: self.canvas.height as usize,
        })
    }
}
