//! TIFF flavoured LZW: MSB-first codes of 9 to 12 bits with the early width switch.

use crate::error::{TiffRasterError, TiffRasterResult};

/// Reset the code table and the code width.
const CLEAR_CODE: usize = 256;
/// End of information.
const EOI_CODE: usize = 257;
/// Codes are at most 12 bits wide.
const MAX_TABLE_SIZE: usize = 4096;

fn corrupt(reason: impl Into<String>) -> TiffRasterError {
    TiffRasterError::CorruptData {
        method: "LZW",
        reason: reason.into(),
    }
}

/// The string table. Every entry owns its bytes, no entry aliases another.
struct CodeTable {
    entries: Vec<Vec<u8>>,
    code_bits: usize,
}

impl CodeTable {
    fn new() -> Self {
        let mut entries = Vec::with_capacity(MAX_TABLE_SIZE);
        entries.extend((0..=255u8).map(|b| vec![b]));
        // CLEAR and EOI never resolve to bytes
        entries.push(vec![]);
        entries.push(vec![]);
        Self {
            entries,
            code_bits: 9,
        }
    }

    /// The code the next added entry will receive.
    fn next_code(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, code: usize) -> Option<&[u8]> {
        self.entries.get(code).map(Vec::as_slice)
    }

    /// Add an entry and widen the codes once the highest code reaches 510, 1022 or 2046.
    ///
    /// A full table is left untouched until the next CLEAR.
    fn add(&mut self, bytes: Vec<u8>) {
        if self.entries.len() >= MAX_TABLE_SIZE {
            return;
        }
        self.entries.push(bytes);
        let max_code = self.entries.len() - 1;
        self.code_bits = match max_code {
            2046.. => 12,
            1022.. => 11,
            510.. => 10,
            _ => 9,
        };
    }
}

/// Reads codes most significant bit first.
struct BitReader<'a> {
    bytes: &'a [u8],
    bit_offset: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            bit_offset: 0,
        }
    }

    /// The next `bits` bits, `None` once fewer than that remain.
    fn read(&mut self, bits: usize) -> Option<usize> {
        if self.bit_offset + bits > self.bytes.len() * 8 {
            return None;
        }
        let mut value = 0;
        let mut remaining = bits;
        while remaining > 0 {
            let byte = self.bytes[self.bit_offset / 8] as usize;
            let available = 8 - self.bit_offset % 8;
            let take = available.min(remaining);
            let chunk = (byte >> (available - take)) & ((1 << take) - 1);
            value = (value << take) | chunk;
            self.bit_offset += take;
            remaining -= take;
        }
        Some(value)
    }
}

/// Decode an LZW stream. Decoding stops at EOI or when the input runs out of bits.
pub(crate) fn decompress(input: &[u8]) -> TiffRasterResult<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() * 2);
    let mut table = CodeTable::new();
    let mut bits = BitReader::new(input);
    let mut previous: Option<usize> = None;

    while let Some(code) = bits.read(table.code_bits) {
        if code == EOI_CODE {
            break;
        }
        if code == CLEAR_CODE {
            table = CodeTable::new();
            previous = None;
            continue;
        }

        let Some(prev) = previous else {
            let bytes = table
                .get(code)
                .ok_or_else(|| corrupt(format!("code {code} is not a literal after a reset")))?;
            output.extend_from_slice(bytes);
            previous = Some(code);
            continue;
        };

        let prev_bytes = table.get(prev).unwrap_or_default();
        let new_entry = if code < table.next_code() {
            let bytes = table.get(code).unwrap_or_default();
            let first = *bytes
                .first()
                .ok_or_else(|| corrupt(format!("code {code} has no bytes")))?;
            output.extend_from_slice(bytes);
            let mut new_entry = prev_bytes.to_vec();
            new_entry.push(first);
            new_entry
        } else if code == table.next_code() {
            let first = *prev_bytes
                .first()
                .ok_or_else(|| corrupt(format!("code {prev} has no bytes")))?;
            let mut new_entry = prev_bytes.to_vec();
            new_entry.push(first);
            output.extend_from_slice(&new_entry);
            new_entry
        } else {
            return Err(corrupt(format!(
                "code {code} is past the next free code {}",
                table.next_code()
            )));
        };
        table.add(new_entry);
        previous = Some(code);
    }

    Ok(output)
}
