//! String pool decoding (ResStringPool)
//!
//! ## Header Layout
//! | Offset | Size | Field         |
//! |--------|------|---------------|
//! | 0x00   | 8    | Chunk header  |
//! | 0x08   | 4    | String count  |
//! | 0x0C   | 4    | Style count   |
//! | 0x10   | 4    | Flags         |
//! | 0x14   | 4    | Strings start |
//! | 0x18   | 4    | Styles start  |
//!
//! The offset table (one u32 per string) follows the header. Offsets are
//! relative to `strings start`, which is relative to the chunk start.

use crate::common::{read_bytes_at, read_u8_at, read_u16_at, read_u32_at, read_utf16_at};
use crate::error::{ApkMetaError, ApkMetaResult};

use super::types::{ChunkHeader, RES_STRING_POOL_TYPE};

/// Strings are UTF-8 instead of UTF-16
pub const UTF8_FLAG: u32 = 0x0000_0100;

/// A string pool borrowed from its containing buffer; strings decode on demand
#[derive(Debug)]
pub struct StringPool<'a> {
    data: &'a [u8],
    offsets: Vec<u32>,
    strings_start: usize,
    utf8: bool,
}

impl<'a> StringPool<'a> {
    /// Parse the string pool chunk that starts at `offset`
    pub fn parse(data: &'a [u8], offset: usize) -> ApkMetaResult<Self> {
        let header = ChunkHeader::read(data, offset)?;
        if header.chunk_type != RES_STRING_POOL_TYPE {
            return Err(ApkMetaError::parse(format!(
                "Expected string pool at offset {}, found chunk 0x{:04x}",
                offset, header.chunk_type
            )));
        }

        let chunk = &data[offset..header.end_offset(offset)];
        let string_count = read_u32_at(chunk, 8)? as usize;
        let flags = read_u32_at(chunk, 16)?;
        let strings_start = read_u32_at(chunk, 20)? as usize;

        let table_offset = header.header_size as usize;
        // Validate the whole table up front so a bogus count fails fast
        read_bytes_at(chunk, table_offset, string_count.saturating_mul(4))?;
        let offsets = (0..string_count)
            .map(|i| read_u32_at(chunk, table_offset + i * 4))
            .collect::<ApkMetaResult<Vec<u32>>>()?;

        Ok(Self {
            data: chunk,
            offsets,
            strings_start,
            utf8: flags & UTF8_FLAG != 0,
        })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn is_utf8(&self) -> bool {
        self.utf8
    }

    /// Decode string `index`
    pub fn get(&self, index: usize) -> ApkMetaResult<String> {
        let rel = *self.offsets.get(index).ok_or_else(|| {
            ApkMetaError::parse(format!(
                "String index {} out of range (pool has {})",
                index,
                self.offsets.len()
            ))
        })?;
        let pos = self.strings_start + rel as usize;

        if self.utf8 {
            // UTF-16 length first (ignored), then UTF-8 byte length
            let (_, skip) = decode_length8(self.data, pos)?;
            let (byte_len, skip2) = decode_length8(self.data, pos + skip)?;
            let bytes = read_bytes_at(self.data, pos + skip + skip2, byte_len)?;
            Ok(String::from_utf8_lossy(bytes).into_owned())
        } else {
            let (char_len, skip) = decode_length16(self.data, pos)?;
            read_utf16_at(self.data, pos + skip, char_len)
        }
    }

    /// Decode string `index`, treating the "no string" sentinel as absent
    pub fn get_optional(&self, index: u32) -> ApkMetaResult<Option<String>> {
        if index == super::types::NO_INDEX {
            return Ok(None);
        }
        self.get(index as usize).map(Some)
    }
}

/// UTF-8 pool lengths: one byte, or two when the high bit is set
fn decode_length8(data: &[u8], pos: usize) -> ApkMetaResult<(usize, usize)> {
    let first = read_u8_at(data, pos)? as usize;
    if first & 0x80 != 0 {
        let second = read_u8_at(data, pos + 1)? as usize;
        Ok((((first & 0x7F) << 8) | second, 2))
    } else {
        Ok((first, 1))
    }
}

/// UTF-16 pool lengths: one unit, or two when the high bit is set
fn decode_length16(data: &[u8], pos: usize) -> ApkMetaResult<(usize, usize)> {
    let first = read_u16_at(data, pos)? as usize;
    if first & 0x8000 != 0 {
        let second = read_u16_at(data, pos + 2)? as usize;
        Ok((((first & 0x7FFF) << 16) | second, 4))
    } else {
        Ok((first, 2))
    }
}
