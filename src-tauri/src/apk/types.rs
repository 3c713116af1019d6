//! Type definitions and constants for Android binary resources
//!
//! ## Chunk Header (all chunks)
//! | Offset | Size | Field       |
//! |--------|------|-------------|
//! | 0x00   | 2    | Chunk type  |
//! | 0x02   | 2    | Header size |
//! | 0x04   | 4    | Chunk size  |

use crate::common::{read_u16_at, read_u32_at};
use crate::error::{ApkMetaError, ApkMetaResult};

// =============================================================================
// Chunk Types
// =============================================================================

pub const RES_STRING_POOL_TYPE: u16 = 0x0001;
pub const RES_TABLE_TYPE: u16 = 0x0002;
pub const RES_XML_TYPE: u16 = 0x0003;

pub const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
pub const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
pub const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
pub const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
pub const RES_XML_CDATA_TYPE: u16 = 0x0104;
pub const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;

pub const RES_TABLE_PACKAGE_TYPE: u16 = 0x0200;
pub const RES_TABLE_TYPE_TYPE: u16 = 0x0201;
pub const RES_TABLE_TYPE_SPEC_TYPE: u16 = 0x0202;

pub const CHUNK_HEADER_SIZE: usize = 8;

// =============================================================================
// Res_value data types
// =============================================================================

pub const TYPE_NULL: u8 = 0x00;
pub const TYPE_REFERENCE: u8 = 0x01;
pub const TYPE_ATTRIBUTE: u8 = 0x02;
pub const TYPE_STRING: u8 = 0x03;
pub const TYPE_FLOAT: u8 = 0x04;
pub const TYPE_INT_DEC: u8 = 0x10;
pub const TYPE_INT_HEX: u8 = 0x11;
pub const TYPE_INT_BOOLEAN: u8 = 0x12;

/// Sentinel for "no string" indices in the XML tree
pub const NO_INDEX: u32 = 0xFFFF_FFFF;

// =============================================================================
// Well-known framework attribute IDs (android:*)
// =============================================================================

pub const ATTR_LABEL: u32 = 0x0101_0001;
pub const ATTR_NAME: u32 = 0x0101_0003;
pub const ATTR_VERSION_CODE: u32 = 0x0101_021b;
pub const ATTR_VERSION_NAME: u32 = 0x0101_021c;

pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

pub const ACTION_MAIN: &str = "android.intent.action.MAIN";
pub const CATEGORY_LAUNCHER: &str = "android.intent.category.LAUNCHER";

// =============================================================================
// Chunk Header
// =============================================================================

/// Generic chunk header found at the start of every binary resource chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: u16,
    pub header_size: u16,
    pub size: u32,
}

impl ChunkHeader {
    /// Read and sanity-check a chunk header at `offset`
    pub fn read(data: &[u8], offset: usize) -> ApkMetaResult<Self> {
        let chunk_type = read_u16_at(data, offset)?;
        let header_size = read_u16_at(data, offset + 2)?;
        let size = read_u32_at(data, offset + 4)?;

        if (header_size as usize) < CHUNK_HEADER_SIZE || header_size as u32 > size {
            return Err(ApkMetaError::parse(format!(
                "Invalid chunk 0x{:04x} at offset {}: header {} / size {}",
                chunk_type, offset, header_size, size
            )));
        }
        if offset.saturating_add(size as usize) > data.len() {
            return Err(ApkMetaError::parse(format!(
                "Chunk 0x{:04x} at offset {} overruns buffer ({} > {})",
                chunk_type,
                offset,
                offset.saturating_add(size as usize),
                data.len()
            )));
        }

        Ok(Self { chunk_type, header_size, size })
    }

    /// Offset of the first byte after this chunk's header
    pub fn body_offset(&self, chunk_offset: usize) -> usize {
        chunk_offset + self.header_size as usize
    }

    /// Offset of the next sibling chunk
    pub fn end_offset(&self, chunk_offset: usize) -> usize {
        chunk_offset + self.size as usize
    }
}

// =============================================================================
// Typed values
// =============================================================================

/// A typed resource value (Res_value)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResValue {
    pub data_type: u8,
    pub data: u32,
}

impl ResValue {
    /// Read the 8-byte Res_value structure at `offset`
    pub fn read(data: &[u8], offset: usize) -> ApkMetaResult<Self> {
        // size(u16) res0(u8) dataType(u8) data(u32)
        let data_type = crate::common::read_u8_at(data, offset + 3)?;
        let value = read_u32_at(data, offset + 4)?;
        Ok(Self { data_type, data: value })
    }

    pub fn is_reference(&self) -> bool {
        self.data_type == TYPE_REFERENCE && self.data != 0
    }
}

/// A value after string-pool lookup, before any resource resolution
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Literal text
    Text(String),
    /// Reference to a resource ID (`@0x7f...`)
    Reference(u32),
}

impl AttrValue {
    /// Render a typed value without any string pool context
    pub fn format_scalar(value: &ResValue) -> Option<String> {
        match value.data_type {
            TYPE_NULL => None,
            TYPE_INT_DEC => Some((value.data as i32).to_string()),
            TYPE_INT_HEX => Some(format!("0x{:08X}", value.data)),
            TYPE_INT_BOOLEAN => Some(if value.data != 0 { "true" } else { "false" }.to_string()),
            TYPE_FLOAT => Some(f32::from_bits(value.data).to_string()),
            TYPE_ATTRIBUTE => Some(format!("?0x{:08x}", value.data)),
            other => Some(format!("(type 0x{:02x})0x{:x}", other, value.data)),
        }
    }
}
