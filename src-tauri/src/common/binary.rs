// Bounds-checked little-endian readers over in-memory buffers
//
// Android binary XML and resource tables are fully loaded before decoding, so
// every read is an offset into a byte slice. Reads past the end return a
// parse error instead of panicking.

use crate::error::{ApkMetaError, ApkMetaResult};

// =============================================================================
// Read at Offset Functions
// =============================================================================

/// Borrow `length` bytes starting at `offset`
pub fn read_bytes_at(data: &[u8], offset: usize, length: usize) -> ApkMetaResult<&[u8]> {
    offset
        .checked_add(length)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            ApkMetaError::parse(format!(
                "Truncated data: need {} bytes at offset {}, have {}",
                length,
                offset,
                data.len()
            ))
        })
}

/// Read u8 at specific offset
pub fn read_u8_at(data: &[u8], offset: usize) -> ApkMetaResult<u8> {
    Ok(read_bytes_at(data, offset, 1)?[0])
}

/// Read u16 little-endian at specific offset
pub fn read_u16_at(data: &[u8], offset: usize) -> ApkMetaResult<u16> {
    let b = read_bytes_at(data, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

/// Read u32 little-endian at specific offset
pub fn read_u32_at(data: &[u8], offset: usize) -> ApkMetaResult<u32> {
    let b = read_bytes_at(data, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

// =============================================================================
// String Decoding
// =============================================================================

/// Decode `count` UTF-16LE code units at `offset`
pub fn read_utf16_at(data: &[u8], offset: usize, count: usize) -> ApkMetaResult<String> {
    let byte_len = count
        .checked_mul(2)
        .ok_or_else(|| ApkMetaError::parse("UTF-16 string length overflow"))?;
    let bytes = read_bytes_at(data, offset, byte_len)?;
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    Ok(String::from_utf16_lossy(&units))
}
