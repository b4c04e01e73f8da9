use std::collections::HashMap;

pub type Code = u16;

/// Hard cap on the number of codes in the table, reserved codes included. Every code fits in 12 bits.
pub const MAX_TABLE_SIZE: usize = 4095;
pub const MAX_CODE_WIDTH: u8 = 12;

#[derive(Clone, Copy, Debug)]
struct Entry {
    prefix: Option<Code>,
    symbol: u8,
}

/// LZW code table. Entries live in an arena addressed by code; a sequence is stored as
/// (code of the sequence without its last symbol, last symbol), which is also the lookup key.
pub struct Dictionary {
    palette_size: u16,
    entries: Vec<Entry>,
    codes: HashMap<(Code, u8), Code>,
    width: u8,
}

impl Dictionary {

    pub fn new(palette_size: u16) -> Self {
        let mut dictionary = Dictionary {
            palette_size,
            entries: Vec::with_capacity(MAX_TABLE_SIZE),
            codes: HashMap::with_capacity(MAX_TABLE_SIZE),
            width: 0,
        };

        dictionary.reset(palette_size);
        dictionary
    }

    /// Drops every learned sequence. Codes `0..palette_size` map to themselves, followed by the
    /// clear code and the end-of-information code.
    pub fn reset(&mut self, palette_size: u16) {
        assert!(palette_size >= 2 && palette_size as usize + 2 <= MAX_TABLE_SIZE, "unsupported palette size {}", palette_size);

        self.palette_size = palette_size;
        self.entries.clear();
        self.codes.clear();

        for symbol in 0..palette_size {
            self.entries.push(Entry {
                prefix: None,
                symbol: symbol as u8,
            });
        }

        // clear and end-of-information codes have no sequence
        self.entries.push(Entry { prefix: None, symbol: 0 });
        self.entries.push(Entry { prefix: None, symbol: 0 });

        self.width = bits_for(palette_size + 1);
    }

    pub fn palette_size(&self) -> u16 {
        self.palette_size
    }

    pub fn clear_code(&self) -> Code {
        self.palette_size
    }

    pub fn end_code(&self) -> Code {
        self.palette_size + 1
    }

    /// Value of the "LZW minimum code size" field that precedes the frame data.
    pub fn min_code_size(&self) -> u8 {
        bits_for(self.palette_size + 1) - 1
    }

    /// Width of the next emitted code.
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Width of the end-of-information code. A decoder adds one more entry after reading the final
    /// data code, so the end code is read one table entry later than the code before it.
    pub fn end_width(&self) -> u8 {
        bits_for(self.entries.len() as Code).min(MAX_CODE_WIDTH)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_code(&self) -> Code {
        self.entries.len() as Code
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_TABLE_SIZE
    }

    /// Code of the sequence `prefix` followed by `symbol`.
    pub fn find(&self, prefix: Code, symbol: u8) -> Option<Code> {
        self.codes.get(&(prefix, symbol)).copied()
    }

    /// Code of an exact sequence of palette indices.
    pub fn lookup(&self, sequence: &[u8]) -> Option<Code> {
        let (first, rest) = sequence.split_first()?;
        if *first as u16 >= self.palette_size {
            return None;
        }

        let mut code = *first as Code;
        for symbol in rest {
            code = self.find(code, *symbol)?;
        }

        Some(code)
    }

    /// Adds `prefix + symbol` at the next free code. The width grows once the newest code no longer
    /// fits, which is one entry after the table size crosses a power of two.
    ///
    /// Must not be called on a full table: the caller emits a clear code and resets instead.
    pub fn insert(&mut self, prefix: Code, symbol: u8) -> Code {
        assert!(!self.is_full(), "dictionary is full, it should have been reset");
        debug_assert!((prefix as usize) < self.entries.len());

        let code = self.next_code();
        self.entries.push(Entry {
            prefix: Some(prefix),
            symbol,
        });
        self.codes.insert((prefix, symbol), code);

        self.width = bits_for(code);
        assert!(self.width <= MAX_CODE_WIDTH, "code width {} exceeds {} bits", self.width, MAX_CODE_WIDTH);

        code
    }

    /// Expands a code back into the sequence of palette indices it stands for. Clear, end and
    /// unassigned codes have no sequence.
    pub fn sequence(&self, code: Code) -> Option<Vec<u8>> {
        if code == self.clear_code() || code == self.end_code() || code as usize >= self.entries.len() {
            return None;
        }

        let mut sequence = Vec::new();
        let mut next = Some(code);

        while let Some(code) = next {
            let entry = self.entries[code as usize];
            sequence.push(entry.symbol);
            next = entry.prefix;
        }

        sequence.reverse();
        Some(sequence)
    }
}

/// Number of bits needed to write `value`.
pub fn bits_for(value: Code) -> u8 {
    (16 - value.leading_zeros()).max(1) as u8
}
