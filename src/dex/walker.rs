/* Structural walker for dex files: header fields, then each mapped section in rows */

use log::warn;
use serde::{Deserialize, Serialize};

use crate::dex::{read_u2, read_u4, DEX_FILE_MAGIC_PREFIX, ENDIAN_CONSTANT, HEADER_SIZE};
use crate::error::HexError;
use crate::events::{EventSink, ParseEvent, StructureParser};
use crate::text::IntegrityFlags;

const DEFAULT_ROW_WIDTH: usize = 16;
const MAP_ITEM_SIZE: usize = 12;

const HEADER_FIELDS: [(&str, usize); 23] = [
    ("magic", 8),
    ("checksum", 4),
    ("signature", 20),
    ("file_size", 4),
    ("header_size", 4),
    ("endian_tag", 4),
    ("link_size", 4),
    ("link_off", 4),
    ("map_off", 4),
    ("string_ids_size", 4),
    ("string_ids_off", 4),
    ("type_ids_size", 4),
    ("type_ids_off", 4),
    ("proto_ids_size", 4),
    ("proto_ids_off", 4),
    ("field_ids_size", 4),
    ("field_ids_off", 4),
    ("method_ids_size", 4),
    ("method_ids_off", 4),
    ("class_defs_size", 4),
    ("class_defs_off", 4),
    ("data_size", 4),
    ("data_off", 4),
];

/// Options for dumping a dex file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexDumpOptions
{
    /// Markers written on line 2 so reassembly keeps the fields as dumped.
    pub flags: IntegrityFlags,
    /// Bytes per data line inside sections.
    pub row_width: usize,
}

impl Default for DexDumpOptions
{
    fn default() -> Self
    {
        DexDumpOptions { flags: IntegrityFlags::default(), row_width: DEFAULT_ROW_WIDTH }
    }
}

pub fn map_type_name(type_code: u16) -> &'static str
{
    match type_code
    {
        0x0000 => "header_item",
        0x0001 => "string_id_item",
        0x0002 => "type_id_item",
        0x0003 => "proto_id_item",
        0x0004 => "field_id_item",
        0x0005 => "method_id_item",
        0x0006 => "class_def_item",
        0x0007 => "call_site_id_item",
        0x0008 => "method_handle_item",
        0x1000 => "map_list",
        0x1001 => "type_list",
        0x1002 => "annotation_set_ref_list",
        0x1003 => "annotation_set_item",
        0x2000 => "class_data_item",
        0x2001 => "code_item",
        0x2002 => "string_data_item",
        0x2003 => "debug_info_item",
        0x2004 => "annotation_item",
        0x2005 => "encoded_array_item",
        0x2006 => "annotations_directory_item",
        0xf000 => "hiddenapi_class_data_item",
        _ => "unknown_item",
    }
}

fn describe_header_field(name: &str, bytes: &[u8]) -> String
{
    match name
    {
        "magic" => format!("magic: \"{}\"", bytes.escape_ascii()),
        "signature" => format!("signature: {}", bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()),
        _ => {
            let v = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            if name == "endian_tag" && v != ENDIAN_CONSTANT
            {
                format!("endian_tag: {:08x} (unexpected)", v)
            }
            else
            {
                format!("{}: {:08x}", name, v)
            }
        }
    }
}

pub struct DexWalker<'b>
{
    bytes: &'b [u8],
    row_width: usize,
}

impl<'b> DexWalker<'b>
{
    pub fn new(bytes: &'b [u8], row_width: usize) -> Self
    {
        let row_width = if row_width == 0 { DEFAULT_ROW_WIDTH } else { row_width };
        DexWalker { bytes, row_width }
    }

    /// Section start offsets from the map list, sorted, or empty if the map list is unusable.
    fn sections(&self) -> Vec<(usize, u16)>
    {
        let bytes = self.bytes;
        let mut ix = 0x34;
        let map_off = match read_u4(bytes, &mut ix)
        {
            Some(off) => off as usize,
            None => return vec![],
        };
        let mut ix = map_off;
        let count = match read_u4(bytes, &mut ix)
        {
            Some(c) if map_off >= HEADER_SIZE => c as usize,
            _ => {
                warn!("dex map list at {:08x} is unusable", map_off);
                return vec![];
            }
        };
        if count.saturating_mul(MAP_ITEM_SIZE) > bytes.len() - ix
        {
            warn!("dex map list claims {} items, more than the file holds", count);
            return vec![];
        }
        let mut sections = Vec::with_capacity(count);
        for _ in 0..count
        {
            let entry = (read_u2(bytes, &mut ix), read_u2(bytes, &mut ix), read_u4(bytes, &mut ix), read_u4(bytes, &mut ix));
            if let (Some(type_code), Some(_), Some(_), Some(offset)) = entry
            {
                let offset = offset as usize;
                if offset >= HEADER_SIZE && offset < bytes.len()
                {
                    sections.push((offset, type_code));
                }
            }
        }
        sections.sort();
        sections.dedup_by_key(|s| s.0);
        sections
    }

    fn rows(&self, sink: &mut EventSink<'_>, start: usize, end: usize, name: &str) -> Result<(), HexError>
    {
        let region = &self.bytes[start..end];
        for (i, row) in region.chunks(self.row_width).enumerate()
        {
            let rel = i * self.row_width;
            let description = if rel == 0 { name.to_string() } else { format!("{} +{:x}", name, rel) };
            sink(ParseEvent::parsed(start + rel, row, description))?;
        }
        Ok(())
    }
}

impl StructureParser for DexWalker<'_>
{
    fn walk(&mut self, sink: &mut EventSink<'_>) -> Result<(), HexError>
    {
        let bytes = self.bytes;
        let mut ix = 0;
        if !bytes.starts_with(&DEX_FILE_MAGIC_PREFIX)
        {
            warn!("dex file does not start with the dex magic");
        }

        sink(ParseEvent::ChangeIndent(1))?;
        for (name, size) in HEADER_FIELDS
        {
            match bytes.get(ix..ix + size)
            {
                Some(field) => sink(ParseEvent::parsed(ix, field, describe_header_field(name, field)))?,
                None => {
                    warn!("dex file ends inside the header at {}", name);
                    sink(ParseEvent::parsed(ix, &bytes[ix..], "truncated header"))?;
                    return sink(ParseEvent::ChangeIndent(-1));
                }
            }
            ix += size;
        }
        sink(ParseEvent::ChangeIndent(-1))?;

        let sections = self.sections();
        if sections.is_empty()
        {
            return self.rows(sink, ix, bytes.len(), "data");
        }
        for (i, &(offset, type_code)) in sections.iter().enumerate()
        {
            if offset > ix
            {
                self.rows(sink, ix, offset, "unmapped")?;
            }
            let end = sections.get(i + 1).map(|s| s.0).unwrap_or(bytes.len());
            sink(ParseEvent::ChangeIndent(1))?;
            self.rows(sink, offset, end, map_type_name(type_code))?;
            sink(ParseEvent::ChangeIndent(-1))?;
            ix = end;
        }
        Ok(())
    }
}
