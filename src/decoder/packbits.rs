//! PackBits, the byte oriented run-length scheme of TIFF 6.0 section 9.

use crate::error::{TiffRasterError, TiffRasterResult};

fn truncated(at: usize) -> TiffRasterError {
    TiffRasterError::CorruptData {
        method: "PackBits",
        reason: format!("run header at byte {at} is cut short"),
    }
}

/// Expand PackBits data. Each signed header byte `h` is followed by:
///
/// - `0..=127`: `h + 1` literal bytes
/// - `-127..=-1`: one byte, repeated `1 - h` times
/// - `-128`: nothing
pub(crate) fn decompress(input: &[u8]) -> TiffRasterResult<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() * 2);
    let mut pos = 0;
    while pos < input.len() {
        let header = input[pos] as i8;
        let start = pos;
        pos += 1;
        match header {
            -128 => {}
            0..=127 => {
                let count = header as usize + 1;
                let literal = input.get(pos..pos + count).ok_or_else(|| truncated(start))?;
                output.extend_from_slice(literal);
                pos += count;
            }
            _ => {
                let byte = *input.get(pos).ok_or_else(|| truncated(start))?;
                let count = (1 - header as isize) as usize;
                output.extend(std::iter::repeat(byte).take(count));
                pos += 1;
            }
        }
    }
    Ok(output)
}
