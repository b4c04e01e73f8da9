use bit_vec::BitVec;

/// Packs variable-width codes least-significant-bit first. A code that does not fit in the current
/// byte continues with its high bits in the next one.
pub struct BitPacker {
    bits: BitVec,
}

impl BitPacker {

    pub fn new() -> Self {
        BitPacker {
            bits: BitVec::new(),
        }
    }

    pub fn push(&mut self, code: u16, width: u8) {
        debug_assert!(width <= 16);
        debug_assert!(width == 16 || (code as u32) < (1 << width));

        for i in 0..width {
            self.bits.push(((code >> i) & 0b1) == 1);
        }
    }

    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// The unused high bits of a partially filled last byte are zero.
    pub fn into_bytes(self) -> Vec<u8> {
        // BitVec stores the first bit as the most significant bit of each byte
        self.bits.to_bytes()
            .into_iter()
            .map(u8::reverse_bits)
            .collect()
    }
}

impl Default for BitPacker {

    fn default() -> Self {
        Self::new()
    }
}
