/* Shared pieces of the annotated hex text format (.cfh / .dfh) */

use nom::bytes::complete::take_while_m_n;
use nom::combinator::{all_consuming, map_res};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::HexError;

pub const CLASS_HEADER_PREFIX: &str = "//@class:";
pub const DEX_HEADER_PREFIX: &str = "// Processing '";
pub const LEAVE_CHECKSUM_MARKER: &str = "//@leaveChecksum";
pub const LEAVE_SIGNATURE_MARKER: &str = "//@leaveSignature";
pub const COMMENT_PREFIX: &str = "//";

pub const CLASS_TEXT_EXTENSION: &str = "cfh";
pub const DEX_TEXT_EXTENSION: &str = "dfh";
pub const DEX_OUTPUT_NAME: &str = "classes.dex";

const INDENT_STEP: &str = "    ";

/// Which binary container a text document encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind
{
    Class,
    Dex,
}

impl DocumentKind
{
    /// Selects the kind from a `.cfh` / `.dfh` file name.
    pub fn from_path(path: &Path) -> Result<DocumentKind, HexError>
    {
        match path.extension().and_then(|e| e.to_str())
        {
            Some(CLASS_TEXT_EXTENSION) => Ok(DocumentKind::Class),
            Some(DEX_TEXT_EXTENSION) => Ok(DocumentKind::Dex),
            _ => fail!(Format, "expected a .{} or .{} file: {}", CLASS_TEXT_EXTENSION, DEX_TEXT_EXTENSION, path.display()),
        }
    }

    pub fn is_dex(&self) -> bool
    {
        *self == DocumentKind::Dex
    }
}

/// Which dex integrity fields must be kept exactly as written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityFlags
{
    pub leave_checksum: bool,
    pub leave_signature: bool,
}

impl IntegrityFlags
{
    /// Reads the markers from the second line of a dex document.
    pub fn from_marker_line(line: &str) -> IntegrityFlags
    {
        IntegrityFlags {
            leave_checksum: line.contains(LEAVE_CHECKSUM_MARKER),
            leave_signature: line.contains(LEAVE_SIGNATURE_MARKER),
        }
    }

    /// The second line a dex dump starts with.
    pub fn marker_line(&self) -> String
    {
        let mut markers = vec![];
        if self.leave_checksum
        {
            markers.push(LEAVE_CHECKSUM_MARKER);
        }
        if self.leave_signature
        {
            markers.push(LEAVE_SIGNATURE_MARKER);
        }
        if markers.is_empty() { COMMENT_PREFIX.to_string() } else { markers.join(" ") }
    }
}

pub fn is_comment(line: &str) -> bool
{
    line.trim().starts_with(COMMENT_PREFIX)
}

fn hex_byte(token: &str) -> IResult<&str, u8>
{
    all_consuming(map_res(
        take_while_m_n(1, 2, |c: char| c.is_ascii_hexdigit()),
        |digits: &str| u8::from_str_radix(digits, 16),
    ))(token)
}

/// Appends the bytes of one data line to `out`. Comment lines contribute nothing.
pub fn decode_data_line(line: &str, out: &mut Vec<u8>) -> Result<usize, HexError>
{
    if is_comment(line)
    {
        return Ok(0);
    }
    let start = out.len();
    for token in line.split_whitespace()
    {
        match hex_byte(token)
        {
            Ok((_, b)) => out.push(b),
            Err(_) => fail!(Format, "invalid hex byte '{}'", token),
        }
    }
    Ok(out.len() - start)
}

pub fn indent_prefix(level: usize) -> String
{
    INDENT_STEP.repeat(level)
}

/// Each byte as its ASCII character, or `.` when not printable, padded to line up with the hex form.
pub fn printable_line(bytes: &[u8]) -> String
{
    let mut out = String::with_capacity(bytes.len() * 3);
    for &b in bytes
    {
        out.push(if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' });
        out.push_str("  ");
    }
    out
}

pub fn hex_line(bytes: &[u8]) -> String
{
    bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
}

/// Turns a logical source or class path into a dotted type name: `com/example/Foo.java` -> `com.example.Foo`.
pub fn dotted_name(logical_path: &str) -> String
{
    let trimmed = logical_path
        .strip_suffix(".class")
        .or_else(|| logical_path.strip_suffix(".java"))
        .unwrap_or(logical_path);
    trimmed
        .trim_start_matches(['/', '\\'])
        .replace(['/', '\\'], ".")
}

pub fn class_header_line(dotted: &str) -> String
{
    format!("{}{}", CLASS_HEADER_PREFIX, dotted)
}

pub fn dex_header_line(name: &str) -> String
{
    format!("{}{}'...", DEX_HEADER_PREFIX, name)
}

/// Works out where the binary for a document goes, from its first line.
pub fn resolve_output_path(header: &str, kind: DocumentKind, output_base: &Path) -> Result<PathBuf, HexError>
{
    match kind
    {
        DocumentKind::Class => {
            let name = match header.strip_prefix(CLASS_HEADER_PREFIX)
            {
                Some(n) => n.trim_end(),
                None => fail!(Format, "first line does not start with '{}'", CLASS_HEADER_PREFIX),
            };
            if name.is_empty()
            {
                fail!(Format, "empty class name after '{}'", CLASS_HEADER_PREFIX);
            }
            let slashed = name.replace('.', "/");
            let mut segments: Vec<&str> = slashed.split('/').filter(|s| !s.is_empty()).collect();
            let simple_name = match segments.pop()
            {
                Some(s) => s,
                None => fail!(Format, "unusable class name '{}'", name),
            };
            let mut path = output_base.to_path_buf();
            for segment in segments
            {
                path.push(segment);
            }
            path.push(format!("{}.class", simple_name));
            Ok(path)
        }
        DocumentKind::Dex => {
            if !header.starts_with(DEX_HEADER_PREFIX)
            {
                fail!(Format, "first line does not start with \"{}\"", DEX_HEADER_PREFIX);
            }
            Ok(output_base.join(DEX_OUTPUT_NAME))
        }
    }
}
