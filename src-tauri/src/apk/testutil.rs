//! Test-only encoders for binary XML, resource tables and whole APKs

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::types::*;
use super::{MANIFEST_ENTRY, RESOURCES_ENTRY};

/// Attribute value for [`AxmlBuilder`]
#[derive(Debug, Clone, Copy)]
pub enum Value<'a> {
    Str(&'a str),
    Int(i32),
    Bool(bool),
    Ref(u32),
    /// String whose raw-value index and typed data point at different strings
    SplitStr { raw: &'a str, data: &'a str },
}

fn android_attr_id(name: &str) -> Option<u32> {
    match name {
        "label" => Some(ATTR_LABEL),
        "name" => Some(ATTR_NAME),
        "versionCode" => Some(ATTR_VERSION_CODE),
        "versionName" => Some(ATTR_VERSION_NAME),
        "icon" => Some(0x0101_0002),
        "exported" => Some(0x0101_0010),
        _ => None,
    }
}

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn chunk_header(out: &mut Vec<u8>, chunk_type: u16, header_size: u16, size: u32) {
    push_u16(out, chunk_type);
    push_u16(out, header_size);
    push_u32(out, size);
}

fn encode_len8(out: &mut Vec<u8>, n: usize) {
    if n > 0x7F {
        out.push(((n >> 8) as u8) | 0x80);
        out.push((n & 0xFF) as u8);
    } else {
        out.push(n as u8);
    }
}

/// Encode a complete string pool chunk
pub fn encode_string_pool(strings: &[&str], utf8: bool) -> Vec<u8> {
    let mut offsets = Vec::with_capacity(strings.len());
    let mut body = Vec::new();
    for s in strings {
        offsets.push(body.len() as u32);
        if utf8 {
            encode_len8(&mut body, s.chars().map(char::len_utf16).sum());
            encode_len8(&mut body, s.len());
            body.extend_from_slice(s.as_bytes());
            body.push(0);
        } else {
            let units: Vec<u16> = s.encode_utf16().collect();
            if units.len() > 0x7FFF {
                push_u16(&mut body, ((units.len() >> 16) as u16) | 0x8000);
                push_u16(&mut body, (units.len() & 0xFFFF) as u16);
            } else {
                push_u16(&mut body, units.len() as u16);
            }
            for unit in units {
                push_u16(&mut body, unit);
            }
            push_u16(&mut body, 0);
        }
    }
    while body.len() % 4 != 0 {
        body.push(0);
    }

    let header_size = 28u32;
    let strings_start = header_size + 4 * strings.len() as u32;
    let size = strings_start + body.len() as u32;

    let mut out = Vec::with_capacity(size as usize);
    chunk_header(&mut out, RES_STRING_POOL_TYPE, header_size as u16, size);
    push_u32(&mut out, strings.len() as u32);
    push_u32(&mut out, 0); // style count
    push_u32(&mut out, if utf8 { super::strings::UTF8_FLAG } else { 0 });
    push_u32(&mut out, strings_start);
    push_u32(&mut out, 0); // styles start
    for off in offsets {
        push_u32(&mut out, off);
    }
    out.extend_from_slice(&body);
    out
}

// =============================================================================
// Binary XML
// =============================================================================

enum Node {
    Start { name: String, attrs: Vec<(bool, String, OwnedValue)> },
    End { name: String },
}

#[derive(Clone)]
enum OwnedValue {
    Str(String),
    Int(i32),
    Bool(bool),
    Ref(u32),
    SplitStr(String, String),
}

/// Builds an AXML document the way aapt2 lays it out
pub struct AxmlBuilder {
    nodes: Vec<Node>,
    obfuscate: bool,
    utf8: bool,
}

impl AxmlBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), obfuscate: false, utf8: false }
    }

    /// Blank out android attribute names, leaving only the resource map
    pub fn obfuscate_attribute_names(&mut self) {
        self.obfuscate = true;
    }

    pub fn use_utf8(&mut self) {
        self.utf8 = true;
    }

    /// Open an element; attribute tuples are (namespace prefix, name, value)
    pub fn start(&mut self, name: &str, attrs: &[(&str, &str, Value)]) {
        let attrs = attrs
            .iter()
            .map(|(ns, attr, value)| {
                let owned = match value {
                    Value::Str(s) => OwnedValue::Str(s.to_string()),
                    Value::Int(i) => OwnedValue::Int(*i),
                    Value::Bool(b) => OwnedValue::Bool(*b),
                    Value::Ref(r) => OwnedValue::Ref(*r),
                    Value::SplitStr { raw, data } => OwnedValue::SplitStr(raw.to_string(), data.to_string()),
                };
                (*ns == "android", attr.to_string(), owned)
            })
            .collect();
        self.nodes.push(Node::Start { name: name.to_string(), attrs });
    }

    pub fn end(&mut self, name: &str) {
        self.nodes.push(Node::End { name: name.to_string() });
    }

    pub fn finish(self) -> Vec<u8> {
        // Android attribute names first so the resource map can cover them
        let mut strings: Vec<String> = Vec::new();
        let mut resource_map: Vec<u32> = Vec::new();
        let mut android_index: Vec<(String, u32)> = Vec::new();

        for node in &self.nodes {
            if let Node::Start { attrs, .. } = node {
                for (is_android, name, _) in attrs {
                    if !is_android || android_index.iter().any(|(n, _)| n == name) {
                        continue;
                    }
                    let id = android_attr_id(name).unwrap_or(0x0101_ffff);
                    android_index.push((name.clone(), strings.len() as u32));
                    strings.push(if self.obfuscate { String::new() } else { name.clone() });
                    resource_map.push(id);
                }
            }
        }

        let intern = |strings: &mut Vec<String>, s: &str| -> u32 {
            // Skip the android-name prefix so plain names never alias a mapped index
            if let Some(pos) = strings
                .iter()
                .skip(resource_map.len())
                .position(|x| x == s)
            {
                return (pos + resource_map.len()) as u32;
            }
            strings.push(s.to_string());
            (strings.len() - 1) as u32
        };

        let prefix_idx = intern(&mut strings, "android");
        let uri_idx = intern(&mut strings, ANDROID_NS);

        let mut body = Vec::new();
        for node in &self.nodes {
            match node {
                Node::Start { name, attrs } => {
                    let name_idx = intern(&mut strings, name);
                    let mut chunk = Vec::new();
                    let size = 16 + 20 + 20 * attrs.len() as u32;
                    chunk_header(&mut chunk, RES_XML_START_ELEMENT_TYPE, 16, size);
                    push_u32(&mut chunk, 1); // line
                    push_u32(&mut chunk, NO_INDEX); // comment
                    push_u32(&mut chunk, NO_INDEX); // ns
                    push_u32(&mut chunk, name_idx);
                    push_u16(&mut chunk, 20); // attribute start
                    push_u16(&mut chunk, 20); // attribute size
                    push_u16(&mut chunk, attrs.len() as u16);
                    push_u16(&mut chunk, 0); // id index
                    push_u16(&mut chunk, 0); // class index
                    push_u16(&mut chunk, 0); // style index

                    for (is_android, attr_name, value) in attrs {
                        let attr_idx = if *is_android {
                            android_index
                                .iter()
                                .find(|(n, _)| n == attr_name)
                                .map(|(_, i)| *i)
                                .unwrap_or(NO_INDEX)
                        } else {
                            intern(&mut strings, attr_name)
                        };
                        let (raw, data_type, data) = match value {
                            OwnedValue::Str(s) => {
                                let idx = intern(&mut strings, s);
                                (idx, TYPE_STRING, idx)
                            }
                            OwnedValue::Int(i) => (NO_INDEX, TYPE_INT_DEC, *i as u32),
                            OwnedValue::Bool(b) => {
                                (NO_INDEX, TYPE_INT_BOOLEAN, if *b { 0xFFFF_FFFF } else { 0 })
                            }
                            OwnedValue::Ref(r) => (NO_INDEX, TYPE_REFERENCE, *r),
                            OwnedValue::SplitStr(raw, data) => {
                                (intern(&mut strings, raw), TYPE_STRING, intern(&mut strings, data))
                            }
                        };
                        push_u32(&mut chunk, if *is_android { uri_idx } else { NO_INDEX });
                        push_u32(&mut chunk, attr_idx);
                        push_u32(&mut chunk, raw);
                        push_u16(&mut chunk, 8);
                        chunk.push(0);
                        chunk.push(data_type);
                        push_u32(&mut chunk, data);
                    }
                    body.extend_from_slice(&chunk);
                }
                Node::End { name } => {
                    let name_idx = intern(&mut strings, name);
                    chunk_header(&mut body, RES_XML_END_ELEMENT_TYPE, 16, 24);
                    push_u32(&mut body, 1);
                    push_u32(&mut body, NO_INDEX);
                    push_u32(&mut body, NO_INDEX);
                    push_u32(&mut body, name_idx);
                }
            }
        }

        let refs: Vec<&str> = strings.iter().map(String::as_str).collect();
        let pool = encode_string_pool(&refs, self.utf8);

        let mut map = Vec::new();
        chunk_header(&mut map, RES_XML_RESOURCE_MAP_TYPE, 8, 8 + 4 * resource_map.len() as u32);
        for id in &resource_map {
            push_u32(&mut map, *id);
        }

        let mut ns_start = Vec::new();
        chunk_header(&mut ns_start, RES_XML_START_NAMESPACE_TYPE, 16, 24);
        push_u32(&mut ns_start, 1);
        push_u32(&mut ns_start, NO_INDEX);
        push_u32(&mut ns_start, prefix_idx);
        push_u32(&mut ns_start, uri_idx);

        let mut ns_end = ns_start.clone();
        ns_end[0..2].copy_from_slice(&RES_XML_END_NAMESPACE_TYPE.to_le_bytes());

        let total = 8 + pool.len() + map.len() + ns_start.len() + body.len() + ns_end.len();
        let mut out = Vec::with_capacity(total);
        chunk_header(&mut out, RES_XML_TYPE, 8, total as u32);
        out.extend_from_slice(&pool);
        out.extend_from_slice(&map);
        out.extend_from_slice(&ns_start);
        out.extend_from_slice(&body);
        out.extend_from_slice(&ns_end);
        out
    }
}

impl Default for AxmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Resource table
// =============================================================================

enum Entry {
    Str(String),
    Ref(u32),
}

/// How [`ArscBuilder`] lays out each type chunk's entry offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryLayout {
    /// One u32 byte offset per entry index
    #[default]
    Dense,
    /// One u16 (offset / 4) per entry index
    Offset16,
    /// Sorted (entry index, offset / 4) u16 pairs for present entries only
    Sparse,
}

/// Builds a `resources.arsc` with a single `string` type (type ID 1)
pub struct ArscBuilder {
    package_id: u8,
    /// (locale, entry index, value)
    entries: Vec<(String, u16, Entry)>,
    layout: EntryLayout,
    compact: bool,
}

impl ArscBuilder {
    pub fn new(package_id: u8) -> Self {
        Self { package_id, entries: Vec::new(), layout: EntryLayout::Dense, compact: false }
    }

    pub fn layout(&mut self, layout: EntryLayout) {
        self.layout = layout;
    }

    /// Emit 8-byte compact entries (key, flags with the value type, data)
    pub fn compact_entries(&mut self) {
        self.compact = true;
    }

    pub fn string(&mut self, entry: u16, locale: &str, value: &str) {
        self.entries.push((locale.to_string(), entry, Entry::Str(value.to_string())));
    }

    pub fn reference(&mut self, entry: u16, locale: &str, target: u32) {
        self.entries.push((locale.to_string(), entry, Entry::Ref(target)));
    }

    pub fn finish(self) -> Vec<u8> {
        let mut global: Vec<String> = Vec::new();
        let entry_count = self.entries.iter().map(|(_, e, _)| *e as usize + 1).max().unwrap_or(0);

        // One type chunk per locale, in first-seen order
        let mut locales: Vec<String> = Vec::new();
        for (locale, _, _) in &self.entries {
            if !locales.contains(locale) {
                locales.push(locale.clone());
            }
        }

        let mut type_chunks = Vec::new();
        for locale in &locales {
            let mut present: Vec<(u16, &Entry)> = self
                .entries
                .iter()
                .filter(|(l, _, _)| l == locale)
                .map(|(_, index, entry)| (*index, entry))
                .collect();
            present.sort_by_key(|(index, _)| *index);

            // (entry index, byte offset into the entry data)
            let mut placed: Vec<(u16, usize)> = Vec::new();
            let mut entries = Vec::new();
            for (index, entry) in present {
                placed.push((index, entries.len()));
                let (data_type, data) = match entry {
                    Entry::Str(s) => {
                        global.push(s.clone());
                        (TYPE_STRING, (global.len() - 1) as u32)
                    }
                    Entry::Ref(target) => (TYPE_REFERENCE, *target),
                };
                if self.compact {
                    push_u16(&mut entries, index); // key
                    push_u16(&mut entries, 0x0008 | ((data_type as u16) << 8));
                    push_u32(&mut entries, data);
                } else {
                    push_u16(&mut entries, 8); // entry size
                    push_u16(&mut entries, 0); // flags
                    push_u32(&mut entries, index as u32); // key
                    push_u16(&mut entries, 8);
                    entries.push(0);
                    entries.push(data_type);
                    push_u32(&mut entries, data);
                }
            }

            let (flags, count, mut table) = match self.layout {
                EntryLayout::Dense => {
                    let mut offsets = vec![0xFFFF_FFFFu32; entry_count];
                    for (index, off) in &placed {
                        offsets[*index as usize] = *off as u32;
                    }
                    let mut table = Vec::new();
                    offsets.into_iter().for_each(|o| push_u32(&mut table, o));
                    (0u8, entry_count, table)
                }
                EntryLayout::Offset16 => {
                    let mut offsets = vec![0xFFFFu16; entry_count];
                    for (index, off) in &placed {
                        offsets[*index as usize] = (*off / 4) as u16;
                    }
                    let mut table = Vec::new();
                    offsets.into_iter().for_each(|o| push_u16(&mut table, o));
                    (0x02, entry_count, table)
                }
                EntryLayout::Sparse => {
                    let mut table = Vec::new();
                    for (index, off) in &placed {
                        push_u16(&mut table, *index);
                        push_u16(&mut table, (*off / 4) as u16);
                    }
                    (0x01, placed.len(), table)
                }
            };
            while table.len() % 4 != 0 {
                table.push(0);
            }

            let header_size = 8 + 1 + 1 + 2 + 4 + 4 + 64;
            let entries_start = header_size + table.len();
            let size = entries_start + entries.len();

            let mut chunk = Vec::with_capacity(size);
            chunk_header(&mut chunk, RES_TABLE_TYPE_TYPE, header_size as u16, size as u32);
            chunk.push(1); // type id
            chunk.push(flags);
            push_u16(&mut chunk, 0);
            push_u32(&mut chunk, count as u32);
            push_u32(&mut chunk, entries_start as u32);
            // ResTable_config (64 bytes): size, imsi, language, country, zeros
            let mut config = vec![0u8; 64];
            config[0..4].copy_from_slice(&64u32.to_le_bytes());
            let lang = locale.as_bytes();
            config[8..8 + lang.len().min(2)].copy_from_slice(&lang[..lang.len().min(2)]);
            chunk.extend_from_slice(&config);
            chunk.append(&mut table);
            chunk.extend_from_slice(&entries);
            type_chunks.push(chunk);
        }

        let mut spec = Vec::new();
        chunk_header(&mut spec, RES_TABLE_TYPE_SPEC_TYPE, 16, 16 + 4 * entry_count as u32);
        spec.push(1);
        spec.push(0);
        push_u16(&mut spec, 0);
        push_u32(&mut spec, entry_count as u32);
        for _ in 0..entry_count {
            push_u32(&mut spec, 0);
        }

        let type_pool = encode_string_pool(&["string"], false);
        let keys: Vec<String> = (0..entry_count).map(|i| format!("key{}", i)).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let key_pool = encode_string_pool(&key_refs, false);

        let package_header = 288usize;
        let package_size = package_header
            + type_pool.len()
            + key_pool.len()
            + spec.len()
            + type_chunks.iter().map(Vec::len).sum::<usize>();

        let mut package = Vec::with_capacity(package_size);
        chunk_header(&mut package, RES_TABLE_PACKAGE_TYPE, package_header as u16, package_size as u32);
        push_u32(&mut package, self.package_id as u32);
        let mut name = [0u8; 256];
        for (i, unit) in "com.example".encode_utf16().enumerate() {
            name[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        package.extend_from_slice(&name);
        push_u32(&mut package, package_header as u32); // type strings
        push_u32(&mut package, 0); // last public type
        push_u32(&mut package, (package_header + type_pool.len()) as u32); // key strings
        push_u32(&mut package, 0); // last public key
        push_u32(&mut package, 0); // type id offset
        package.extend_from_slice(&type_pool);
        package.extend_from_slice(&key_pool);
        package.extend_from_slice(&spec);
        for chunk in &type_chunks {
            package.extend_from_slice(chunk);
        }

        let global_refs: Vec<&str> = global.iter().map(String::as_str).collect();
        let global_pool = encode_string_pool(&global_refs, true);

        let total = 12 + global_pool.len() + package.len();
        let mut out = Vec::with_capacity(total);
        chunk_header(&mut out, RES_TABLE_TYPE, 12, total as u32);
        push_u32(&mut out, 1); // package count
        out.extend_from_slice(&global_pool);
        out.extend_from_slice(&package);
        out
    }
}

// =============================================================================
// APK files
// =============================================================================

/// Zip a manifest (deflated) and optional resource table (stored) into `path`
pub fn write_apk(path: &Path, manifest: &[u8], resources: Option<&[u8]>) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);

    zip.start_file(MANIFEST_ENTRY, SimpleFileOptions::default().compression_method(CompressionMethod::Deflated))
        .unwrap();
    zip.write_all(manifest).unwrap();

    if let Some(arsc) = resources {
        zip.start_file(RESOURCES_ENTRY, SimpleFileOptions::default().compression_method(CompressionMethod::Stored))
            .unwrap();
        zip.write_all(arsc).unwrap();
    }

    zip.start_file("classes.dex", SimpleFileOptions::default()).unwrap();
    zip.write_all(b"dex\n035\0").unwrap();
    zip.finish().unwrap();
}

/// A small but complete APK: package, label via resources, version fields
pub fn write_sample_apk(path: &Path, package: &str, label: &str, version_name: &str, version_code: i32) {
    let mut arsc = ArscBuilder::new(0x7f);
    arsc.string(0, "", label);
    let arsc = arsc.finish();

    let mut b = AxmlBuilder::new();
    b.start("manifest", &[
        ("", "package", Value::Str(package)),
        ("android", "versionCode", Value::Int(version_code)),
        ("android", "versionName", Value::Str(version_name)),
    ]);
    b.start("application", &[
        ("android", "label", Value::Ref(0x7f01_0000)),
        ("android", "exported", Value::Bool(true)),
    ]);
    b.end("application");
    b.end("manifest");

    write_apk(path, &b.finish(), Some(&arsc));
}
