//! Resource table (`resources.arsc`) lookups
//!
//! Only enough of the table is indexed to resolve `@0xPPTTEEEE` references
//! found in the manifest (application label, version name):
//!
//! ```text
//! [Table header      0x0002]
//! [Global strings    0x0001]
//! [Package           0x0200]
//!     [Type strings  0x0001]
//!     [Key strings   0x0001]
//!     [Type spec     0x0202] ...
//!     [Type          0x0201] ... (one per type and configuration)
//! ```
//!
//! Type chunks are indexed when the table is opened; entries are decoded on
//! lookup.

use tracing::{debug, trace};

use crate::common::{read_bytes_at, read_u8_at, read_u16_at, read_u32_at};
use crate::error::{ApkMetaError, ApkMetaResult};

use super::strings::StringPool;
use super::types::*;

/// Reference chains longer than this are treated as unresolvable
pub const MAX_REFERENCE_DEPTH: usize = 8;

const NO_ENTRY: u32 = 0xFFFF_FFFF;
const NO_ENTRY16: u16 = 0xFFFF;

// ResTable_type flags
const TYPE_FLAG_SPARSE: u8 = 0x01;
const TYPE_FLAG_OFFSET16: u8 = 0x02;

// ResTable_entry flags
const ENTRY_FLAG_COMPLEX: u16 = 0x0001;
const ENTRY_FLAG_COMPACT: u16 = 0x0008;

/// Offset of ResTable_config inside a type chunk
const TYPE_CONFIG_OFFSET: usize = 20;

/// Index entry for one ResTable_type chunk
#[derive(Debug, Clone)]
struct TypeChunk {
    package_id: u8,
    type_id: u8,
    offset: usize,
    header_size: usize,
    end: usize,
    flags: u8,
    entry_count: usize,
    entries_start: usize,
    /// Locale is unset (language and country both zero)
    default_locale: bool,
}

/// A parsed resource table borrowing the raw `resources.arsc` bytes
pub struct ResourceTable<'a> {
    data: &'a [u8],
    strings: StringPool<'a>,
    types: Vec<TypeChunk>,
}

impl<'a> ResourceTable<'a> {
    /// Index the table's global string pool and all type chunks
    pub fn parse(data: &'a [u8]) -> ApkMetaResult<Self> {
        let root = ChunkHeader::read(data, 0)?;
        if root.chunk_type != RES_TABLE_TYPE {
            return Err(ApkMetaError::parse(format!(
                "Not a resource table (chunk type 0x{:04x})",
                root.chunk_type
            )));
        }

        let mut strings = None;
        let mut types = Vec::new();
        let end = root.end_offset(0);
        let mut offset = root.body_offset(0);

        while offset < end {
            let header = ChunkHeader::read(data, offset)?;
            match header.chunk_type {
                RES_STRING_POOL_TYPE if strings.is_none() => {
                    strings = Some(StringPool::parse(data, offset)?);
                }
                RES_TABLE_PACKAGE_TYPE => {
                    index_package(data, offset, &header, &mut types)?;
                }
                _ => {}
            }
            offset = header.end_offset(offset);
        }

        let strings = strings
            .ok_or_else(|| ApkMetaError::parse("Resource table has no global string pool"))?;
        debug!(type_chunks = types.len(), strings = strings.len(), "Resource table indexed");

        Ok(Self { data, strings, types })
    }

    /// Look up the raw value for `id`, preferring the default configuration
    pub fn lookup(&self, id: u32) -> ApkMetaResult<Option<ResValue>> {
        let package_id = (id >> 24) as u8;
        let type_id = ((id >> 16) & 0xFF) as u8;
        let entry_index = (id & 0xFFFF) as usize;

        let mut fallback = None;
        for chunk in self
            .types
            .iter()
            .filter(|t| t.package_id == package_id && t.type_id == type_id)
        {
            if let Some(value) = self.read_entry(chunk, entry_index)? {
                if chunk.default_locale {
                    return Ok(Some(value));
                }
                if fallback.is_none() {
                    fallback = Some(value);
                }
            }
        }
        Ok(fallback)
    }

    /// Resolve `id` to display text, following reference chains
    pub fn resolve_string(&self, id: u32) -> ApkMetaResult<Option<String>> {
        let mut current = id;
        for _ in 0..MAX_REFERENCE_DEPTH {
            let Some(value) = self.lookup(current)? else {
                trace!(id = current, "Resource not found");
                return Ok(None);
            };
            match value.data_type {
                TYPE_STRING => return self.strings.get(value.data as usize).map(Some),
                TYPE_REFERENCE if value.data != 0 => current = value.data,
                _ => return Ok(AttrValue::format_scalar(&value)),
            }
        }
        debug!(id, "Reference chain too deep");
        Ok(None)
    }

    fn read_entry(&self, chunk: &TypeChunk, entry_index: usize) -> ApkMetaResult<Option<ResValue>> {
        let table = chunk.offset + chunk.header_size;
        let data = &self.data[..chunk.end];

        let entry_offset = if chunk.flags & TYPE_FLAG_SPARSE != 0 {
            // Sorted (index u16, offset/4 u16) pairs
            let mut found = None;
            for i in 0..chunk.entry_count {
                let idx = read_u16_at(data, table + i * 4)? as usize;
                if idx == entry_index {
                    found = Some(read_u16_at(data, table + i * 4 + 2)? as usize * 4);
                    break;
                }
                if idx > entry_index {
                    break;
                }
            }
            match found {
                Some(off) => off,
                None => return Ok(None),
            }
        } else {
            if entry_index >= chunk.entry_count {
                return Ok(None);
            }
            if chunk.flags & TYPE_FLAG_OFFSET16 != 0 {
                let off = read_u16_at(data, table + entry_index * 2)?;
                if off == NO_ENTRY16 {
                    return Ok(None);
                }
                off as usize * 4
            } else {
                let off = read_u32_at(data, table + entry_index * 4)?;
                if off == NO_ENTRY {
                    return Ok(None);
                }
                off as usize
            }
        };

        let entry = chunk.offset + chunk.entries_start + entry_offset;
        let size = read_u16_at(data, entry)? as usize;
        let flags = read_u16_at(data, entry + 2)?;

        if flags & ENTRY_FLAG_COMPACT != 0 {
            let data_type = (flags >> 8) as u8;
            let value = read_u32_at(data, entry + 4)?;
            return Ok(Some(ResValue { data_type, data: value }));
        }
        if flags & ENTRY_FLAG_COMPLEX != 0 {
            // Bags (styles, arrays, plurals) never hold a label
            return Ok(None);
        }
        ResValue::read(data, entry + size).map(Some)
    }
}

/// Package header layout:
/// | Offset | Size | Field                |
/// |--------|------|----------------------|
/// | 0x08   | 4    | Package ID           |
/// | 0x0C   | 256  | Name (UTF-16, fixed) |
/// | 0x10C  | 4    | Type strings offset  |
/// | 0x114  | 4    | Key strings offset   |
fn index_package(
    data: &[u8],
    offset: usize,
    header: &ChunkHeader,
    types: &mut Vec<TypeChunk>,
) -> ApkMetaResult<()> {
    let package_id = read_u32_at(data, offset + 8)? as u8;
    let end = header.end_offset(offset);
    let mut child = header.body_offset(offset);

    while child < end {
        let child_header = ChunkHeader::read(data, child)?;
        if child_header.chunk_type == RES_TABLE_TYPE_TYPE {
            types.push(read_type_chunk(data, child, &child_header, package_id)?);
        }
        child = child_header.end_offset(child);
    }
    Ok(())
}

fn read_type_chunk(
    data: &[u8],
    offset: usize,
    header: &ChunkHeader,
    package_id: u8,
) -> ApkMetaResult<TypeChunk> {
    let type_id = read_u8_at(data, offset + 8)?;
    let flags = read_u8_at(data, offset + 9)?;
    let entry_count = read_u32_at(data, offset + 12)? as usize;
    let entries_start = read_u32_at(data, offset + 16)? as usize;

    // ResTable_config: size(4) imsi(4) language(2) country(2) ...
    let locale = read_bytes_at(data, offset + TYPE_CONFIG_OFFSET + 8, 4)?;
    let default_locale = locale.iter().all(|&b| b == 0);

    if entries_start > header.size as usize {
        return Err(ApkMetaError::parse(format!(
            "Type chunk at {} has entries start {} beyond its size {}",
            offset, entries_start, header.size
        )));
    }

    Ok(TypeChunk {
        package_id,
        type_id,
        offset,
        header_size: header.header_size as usize,
        end: header.end_offset(offset),
        flags,
        entry_count,
        entries_start,
        default_locale,
    })
}
