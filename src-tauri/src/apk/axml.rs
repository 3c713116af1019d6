//! Android binary XML (AXML) decoding
//!
//! `AndroidManifest.xml` is stored inside the APK as a flat sequence of chunks:
//!
//! ```text
//! [XML header        0x0003]
//! [String pool       0x0001]
//! [Resource map      0x0180]  (optional: attribute name index -> android:attr ID)
//! [Start namespace   0x0100]
//! [Start element     0x0102]  (attributes inline)
//! [End element       0x0103]
//! ...
//! [End namespace     0x0101]
//! ```
//!
//! Only element structure and attributes are decoded; text nodes are skipped.

use tracing::trace;

use crate::common::{read_u16_at, read_u32_at};
use crate::error::{ApkMetaError, ApkMetaResult};

use super::strings::StringPool;
use super::types::*;

/// One decoded attribute
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub name: String,
    /// Framework attribute ID from the resource map, if the name index has one
    pub resource_id: Option<u32>,
    pub value: Option<AttrValue>,
}

impl XmlAttribute {
    /// Match an `android:` attribute by resource ID, falling back to its name
    ///
    /// Obfuscated manifests blank or rename attribute strings but must keep the
    /// resource map intact for the platform to read them.
    pub fn is_android_attr(&self, name: &str, resource_id: u32) -> bool {
        match self.resource_id {
            Some(id) => id == resource_id,
            None => {
                self.name == name
                    && matches!(self.namespace.as_deref(), None | Some(ANDROID_NS))
            }
        }
    }
}

/// Element open/close events in document order
#[derive(Debug, Clone, PartialEq)]
pub enum XmlEvent {
    Start {
        name: String,
        attributes: Vec<XmlAttribute>,
    },
    End {
        name: String,
    },
}

/// Decode an AXML document into start/end element events
pub fn parse_xml(data: &[u8]) -> ApkMetaResult<Vec<XmlEvent>> {
    let root = ChunkHeader::read(data, 0)?;
    if root.chunk_type != RES_XML_TYPE {
        return Err(ApkMetaError::parse(format!(
            "Not a binary XML document (chunk type 0x{:04x})",
            root.chunk_type
        )));
    }

    let end = root.end_offset(0);
    let mut offset = root.body_offset(0);
    let mut pool: Option<StringPool> = None;
    let mut resource_map: Vec<u32> = Vec::new();
    let mut events = Vec::new();

    while offset < end {
        let header = ChunkHeader::read(data, offset)?;
        trace!(chunk_type = header.chunk_type, offset, size = header.size, "AXML chunk");

        match header.chunk_type {
            RES_STRING_POOL_TYPE => {
                pool = Some(StringPool::parse(data, offset)?);
            }
            RES_XML_RESOURCE_MAP_TYPE => {
                let body = header.body_offset(offset);
                let count = (header.end_offset(offset) - body) / 4;
                resource_map = (0..count)
                    .map(|i| read_u32_at(data, body + i * 4))
                    .collect::<ApkMetaResult<Vec<u32>>>()?;
            }
            RES_XML_START_ELEMENT_TYPE => {
                let strings = require_pool(&pool)?;
                events.push(read_start_element(data, offset, &header, strings, &resource_map)?);
            }
            RES_XML_END_ELEMENT_TYPE => {
                let strings = require_pool(&pool)?;
                let ext = header.body_offset(offset);
                let name = strings.get(read_u32_at(data, ext + 4)? as usize)?;
                events.push(XmlEvent::End { name });
            }
            // Namespaces, CDATA and unknown chunks carry nothing we report
            _ => {}
        }

        offset = header.end_offset(offset);
    }

    Ok(events)
}

fn require_pool<'p, 'a>(pool: &'p Option<StringPool<'a>>) -> ApkMetaResult<&'p StringPool<'a>> {
    pool.as_ref()
        .ok_or_else(|| ApkMetaError::parse("XML element found before string pool"))
}

/// Start element extension layout (after the 16-byte node header):
/// | Offset | Size | Field           |
/// |--------|------|-----------------|
/// | 0x00   | 4    | Namespace index |
/// | 0x04   | 4    | Name index      |
/// | 0x08   | 2    | Attribute start |
/// | 0x0A   | 2    | Attribute size  |
/// | 0x0C   | 2    | Attribute count |
fn read_start_element(
    data: &[u8],
    offset: usize,
    header: &ChunkHeader,
    strings: &StringPool,
    resource_map: &[u32],
) -> ApkMetaResult<XmlEvent> {
    let ext = header.body_offset(offset);
    let name = strings.get(read_u32_at(data, ext + 4)? as usize)?;
    let attr_start = read_u16_at(data, ext + 8)? as usize;
    let attr_size = read_u16_at(data, ext + 10)? as usize;
    let attr_count = read_u16_at(data, ext + 12)? as usize;

    if attr_count > 0 && attr_size < 20 {
        return Err(ApkMetaError::parse(format!(
            "Element <{}> has invalid attribute size {}",
            name, attr_size
        )));
    }

    let mut attributes = Vec::with_capacity(attr_count);
    for i in 0..attr_count {
        let at = ext + attr_start + i * attr_size;
        if at + attr_size > header.end_offset(offset) {
            return Err(ApkMetaError::parse(format!(
                "Attribute {} of <{}> overruns its element chunk",
                i, name
            )));
        }

        let ns_index = read_u32_at(data, at)?;
        let name_index = read_u32_at(data, at + 4)?;
        let raw_value = read_u32_at(data, at + 8)?;
        let typed = ResValue::read(data, at + 12)?;

        let attr_name = strings.get(name_index as usize)?;
        let value = if typed.data_type == TYPE_STRING {
            // The raw value carries the string index; typed data may not match it
            let index = if raw_value != NO_INDEX { raw_value } else { typed.data };
            Some(AttrValue::Text(strings.get(index as usize)?))
        } else if typed.is_reference() {
            Some(AttrValue::Reference(typed.data))
        } else if raw_value != NO_INDEX {
            Some(AttrValue::Text(strings.get(raw_value as usize)?))
        } else {
            AttrValue::format_scalar(&typed).map(AttrValue::Text)
        };

        attributes.push(XmlAttribute {
            namespace: strings.get_optional(ns_index)?,
            name: attr_name,
            resource_id: resource_map.get(name_index as usize).copied(),
            value,
        });
    }

    Ok(XmlEvent::Start { name, attributes })
}
