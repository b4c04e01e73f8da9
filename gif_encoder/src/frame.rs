use std::cmp::min;

use byteorder::{ByteOrder, LittleEndian};

use raster_core::models::Image;

use crate::{bits::BitPacker, dictionary::{Code, Dictionary}, palette::Palette};

pub const IMAGE_SEPARATOR: u8 = 0x2C;
pub const MAX_SUB_BLOCK_SIZE: usize = 255;

/// Greedy LZW over a stream of palette indices.
pub struct FrameEncoder {
    dictionary: Dictionary,
    packer: BitPacker,
}

impl FrameEncoder {

    pub fn new(palette_size: u16) -> Self {
        FrameEncoder {
            dictionary: Dictionary::new(palette_size),
            packer: BitPacker::new(),
        }
    }

    pub fn min_code_size(&self) -> u8 {
        self.dictionary.min_code_size()
    }

    /// Compresses `indices` into a packed code stream: a clear code, the data codes and the
    /// end-of-information code. Every index must be below the palette size.
    pub fn encode(mut self, indices: &[u8]) -> Vec<u8> {
        let palette_size = self.dictionary.palette_size();
        let clear_code = self.dictionary.clear_code();
        let end_code = self.dictionary.end_code();
        let mut resets = 0;

        self.emit(clear_code, self.dictionary.width());

        let mut symbols = indices.iter();
        let mut current: Code = match symbols.next() {
            Some(symbol) => *symbol as Code,
            None => {
                self.emit(end_code, self.dictionary.end_width());
                return self.packer.into_bytes();
            }
        };

        for &symbol in symbols {
            debug_assert!((symbol as u16) < palette_size);

            if let Some(code) = self.dictionary.find(current, symbol) {
                current = code;
                continue;
            }

            self.emit(current, self.dictionary.width());

            if self.dictionary.is_full() {
                self.emit(clear_code, self.dictionary.width());
                self.dictionary.reset(palette_size);
                resets += 1;
            } else {
                self.dictionary.insert(current, symbol);
            }

            current = symbol as Code;
        }

        self.emit(current, self.dictionary.width());
        self.emit(end_code, self.dictionary.end_width());

        trace!("encoded {} indices into {} bits, dictionary reset {} times", indices.len(), self.packer.bit_len(), resets);

        self.packer.into_bytes()
    }

    fn emit(&mut self, code: Code, width: u8) {
        self.packer.push(code, width);
    }
}

/// Splits compressed data into sub-blocks of at most 255 bytes, each prefixed with its length.
pub fn into_sub_blocks(data: &[u8]) -> Vec<u8> {
    let mut blocks = Vec::with_capacity(data.len() + data.len() / MAX_SUB_BLOCK_SIZE + 1);
    let mut data = data;

    while !data.is_empty() {
        let sub_block_size = min(data.len(), MAX_SUB_BLOCK_SIZE);

        blocks.push(sub_block_size as u8);
        blocks.extend_from_slice(&data[..sub_block_size]);

        data = &data[sub_block_size..];
    }

    blocks
}

/// One compressed raster, ready to be placed in a container.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    width: u16,
    height: u16,
    min_code_size: u8,
    blocks: Vec<u8>, // length-prefixed sub-blocks, without the terminating empty block
}

impl Frame {

    /// Quantizes the image against the palette and compresses it. Only the container builds frames,
    /// after checking the image against its canvas, so the dimensions fit the 16-bit fields.
    pub(crate) fn encode(image: &Image, palette: &Palette) -> Self {
        let indices = palette.index_image(image);

        let encoder = FrameEncoder::new(palette.len() as u16);
        let min_code_size = encoder.min_code_size();
        let compressed = encoder.encode(&indices);

        debug!("frame {}x{}: {} pixels compressed to {} bytes", image.width, image.height, indices.len(), compressed.len());

        Frame {
            width: image.width as u16,
            height: image.height as u16,
            min_code_size,
            blocks: into_sub_blocks(&compressed),
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn min_code_size(&self) -> u8 {
        self.min_code_size
    }

    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }

    /// Image descriptor: origin at (0, 0), frame dimensions, no local color table.
    pub fn descriptor(&self) -> [u8; 10] {
        let mut data = [0u8; 10];
        data[0] = IMAGE_SEPARATOR;

        LittleEndian::write_u16(&mut data[1..3], 0); // left
        LittleEndian::write_u16(&mut data[3..5], 0); // top
        LittleEndian::write_u16(&mut data[5..7], self.width);
        LittleEndian::write_u16(&mut data[7..9], self.height);

        data[9] = 0; // no local color table, not interlaced

        data
    }
}
