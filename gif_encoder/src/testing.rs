//! Minimal reader used by the tests to check what the encoder writes.

use bit_vec::BitVec;
use byteorder::{ByteOrder, LittleEndian};

pub struct DecodedGIF {
    pub signature: Vec<u8>,
    pub width: u16,
    pub height: u16,
    pub packed: u8,
    pub color_table: Vec<u8>,
    pub loop_count: Option<u16>,
    pub frames: Vec<DecodedFrame>,
}

pub struct DecodedFrame {
    pub width: u16,
    pub height: u16,
    pub delay: Option<u16>,
    pub indices: Vec<u8>,
}

/// Walks a container produced by the encoder. Frame data is read block by block until the end code
/// shows up, so both terminated and unterminated frames can be read.
pub fn read_gif(data: &[u8], block_terminator: bool) -> DecodedGIF {
    let signature = data[0..6].to_vec();
    let width = LittleEndian::read_u16(&data[6..8]);
    let height = LittleEndian::read_u16(&data[8..10]);
    let packed = data[10];
    assert_eq!(packed & 0b1000_0000, 0b1000_0000, "global color table flag must be set");

    let table_size = 3 * (1usize << ((packed & 0b111) + 1));
    let color_table = data[13..13 + table_size].to_vec();
    let mut offset = 13 + table_size;

    let mut loop_count = None;
    let mut delay = None;
    let mut frames = Vec::new();

    loop {
        match data[offset] {
            0x21 if data[offset + 1] == 0xFF => {
                assert_eq!(&data[offset + 3..offset + 14], b"NETSCAPE2.0");
                loop_count = Some(LittleEndian::read_u16(&data[offset + 16..offset + 18]));
                assert_eq!(data[offset + 18], 0);
                offset += 19;
            },
            0x21 if data[offset + 1] == 0xF9 => {
                assert_eq!(data[offset + 2], 4);
                delay = Some(LittleEndian::read_u16(&data[offset + 4..offset + 6]));
                assert_eq!(data[offset + 7], 0);
                offset += 8;
            },
            0x2C => {
                let frame_width = LittleEndian::read_u16(&data[offset + 5..offset + 7]);
                let frame_height = LittleEndian::read_u16(&data[offset + 7..offset + 9]);
                assert_eq!(data[offset + 9], 0, "no local color table is expected");
                let min_code_size = data[offset + 10];
                offset += 11;

                let mut compressed = Vec::new();
                let indices = loop {
                    let length = data[offset] as usize;
                    assert!(length > 0, "frame data ended before the end code");
                    compressed.extend_from_slice(&data[offset + 1..offset + 1 + length]);
                    offset += 1 + length;

                    if let Some(indices) = decode_lzw(&compressed, min_code_size) {
                        break indices;
                    }
                };

                if block_terminator {
                    assert_eq!(data[offset], 0, "expected an empty terminating block");
                    offset += 1;
                }

                frames.push(DecodedFrame {
                    width: frame_width,
                    height: frame_height,
                    delay: delay.take(),
                    indices,
                });
            },
            0x3B => {
                assert_eq!(offset + 1, data.len(), "trailer must be the last byte");
                break;
            },
            other => panic!("unexpected block {:#x} at {}", other, offset),
        }
    }

    DecodedGIF {
        signature,
        width,
        height,
        packed,
        color_table,
        loop_count,
        frames,
    }
}

/// Decodes an LZW code stream. Returns `None` if the data ends before the end-of-information code.
pub fn decode_lzw(data: &[u8], min_code_size: u8) -> Option<Vec<u8>> {
    decode_codes(data, min_code_size).map(|(indices, _)| indices)
}

pub fn count_clear_codes(data: &[u8], min_code_size: u8) -> usize {
    decode_codes(data, min_code_size).map(|(_, clears)| clears).unwrap_or(0)
}

fn decode_codes(data: &[u8], min_code_size: u8) -> Option<(Vec<u8>, usize)> {
    let bits = bit_vec_for_source_bytes(data);

    let clear_code = 1usize << min_code_size;
    let end_code = clear_code + 1;

    let mut dictionary: Vec<Vec<u8>> = init_dictionary(clear_code);
    let mut code_size = min_code_size + 1;
    let mut offset = 0;
    let mut prev_code: Option<usize> = None;
    let mut clears = 0;
    let mut indices = Vec::new();

    loop {
        if offset + code_size as usize > bits.len() {
            return None;
        }

        let code = read_bits(&bits, offset, code_size) as usize;
        offset += code_size as usize;

        if code == clear_code {
            dictionary = init_dictionary(clear_code);
            code_size = min_code_size + 1;
            prev_code = None;
            clears += 1;
            continue;
        }

        if code == end_code {
            return Some((indices, clears));
        }

        let value = match prev_code {
            None => dictionary.get(code)?.clone(),
            Some(prev) => {
                let value = if code < dictionary.len() {
                    dictionary[code].clone()
                } else if code == dictionary.len() {
                    // match to an entry that has just been encoded
                    let mut value = dictionary[prev].clone();
                    value.push(value[0]);
                    value
                } else {
                    return None;
                };

                if dictionary.len() < 4096 {
                    let mut entry = dictionary[prev].clone();
                    entry.push(value[0]);
                    dictionary.push(entry);
                }

                value
            },
        };

        indices.extend_from_slice(&value);
        prev_code = Some(code);

        if dictionary.len() == 1 << code_size && code_size < 12 {
            code_size += 1;
        }
    }
}

fn init_dictionary(clear_code: usize) -> Vec<Vec<u8>> {
    let mut dictionary: Vec<Vec<u8>> = (0..clear_code).map(|i| vec![i as u8]).collect();
    dictionary.push(Vec::new());
    dictionary.push(Vec::new());
    dictionary
}

fn read_bits(bits: &BitVec, offset: usize, total: u8) -> u16 {
    let mut result = 0;

    for i in 0..total as usize {
        if bits[offset + i] {
            result |= 1 << i;
        }
    }

    result
}

fn bit_vec_for_source_bytes(data: &[u8]) -> BitVec {
    BitVec::from_fn(data.len() * 8, |x| (data[x / 8] >> (x % 8)) & 0b1 == 1)
}
