//! Structural walker for class files.
//!
//! Reports every part of a class file, in file order, as parse events so that
//! a dump covers each byte exactly once.

pub mod access;
pub mod constant_pool;

use log::warn;

use crate::class::access::{AccessFlags, FlagContext};
use crate::class::constant_pool::{decode_utf8, payload_size, tag_name, Constant, ConstantPool, CONSTANT_CLASS, CONSTANT_DOUBLE, CONSTANT_LONG, CONSTANT_UTF8};
use crate::error::HexError;
use crate::events::{EventSink, MemberKind, ParseEvent, StructureParser};

pub const CLASS_FILE_MAGIC: u32 = 0xcafebabe;

// Class files are big-endian throughout
fn peek_u2(bytes: &[u8], ix: usize) -> Result<u16, HexError>
{
    match bytes.get(ix..ix + 2)
    {
        Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
        None => fail!(Format, "unexpected end of class file reading u2 at index {}", ix),
    }
}

fn peek_u4(bytes: &[u8], ix: usize) -> Result<u32, HexError>
{
    match bytes.get(ix..ix + 4)
    {
        Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        None => fail!(Format, "unexpected end of class file reading u4 at index {}", ix),
    }
}

pub struct ClassFileWalker<'b>
{
    bytes: &'b [u8],
    ix: usize,
    pool: ConstantPool,
}

impl<'b> ClassFileWalker<'b>
{
    pub fn new(bytes: &'b [u8]) -> Self
    {
        ClassFileWalker { bytes, ix: 0, pool: ConstantPool::default() }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'b [u8], HexError>
    {
        let bytes = self.bytes;
        match bytes.get(self.ix..self.ix + len)
        {
            Some(b) => {
                self.ix += len;
                Ok(b)
            }
            None => fail!(Format, "unexpected end of class file reading {} ({} bytes) at index {}", what, len, self.ix),
        }
    }

    fn span(&mut self, sink: &mut EventSink<'_>, len: usize, description: String) -> Result<&'b [u8], HexError>
    {
        let offset = self.ix;
        let b = self.take(len, &description)?;
        sink(ParseEvent::parsed(offset, b, description))?;
        Ok(b)
    }

    fn u2(&mut self, sink: &mut EventSink<'_>, label: &str) -> Result<u16, HexError>
    {
        let v = peek_u2(self.bytes, self.ix)?;
        self.span(sink, 2, format!("{}: {:04x}", label, v))?;
        Ok(v)
    }

    fn constant(&mut self, sink: &mut EventSink<'_>, index: u16) -> Result<bool, HexError>
    {
        let tag = match self.bytes.get(self.ix)
        {
            Some(t) => *t,
            None => fail!(Format, "unexpected end of class file reading constant_pool[{}]", index),
        };
        let (len, description, constant) = if tag == CONSTANT_UTF8
        {
            let n = peek_u2(self.bytes, self.ix + 1)? as usize;
            let start = self.ix + 3;
            let raw = match self.bytes.get(start..start + n)
            {
                Some(r) => r,
                None => fail!(Format, "unexpected end of class file reading constant_pool[{}] Utf8 of {} bytes", index, n),
            };
            let s = decode_utf8(raw);
            (3 + n, format!("constant_pool[{}]: Utf8 \"{}\"", index, s.escape_debug()), Constant::Utf8(s))
        }
        else
        {
            let size = match payload_size(tag)
            {
                Some(s) => s,
                None => fail!(Format, "unknown constant pool tag {} for constant_pool[{}] at index {}", tag, index, self.ix),
            };
            let payload = match self.bytes.get(self.ix + 1..self.ix + 1 + size)
            {
                Some(p) => p,
                None => fail!(Format, "unexpected end of class file reading constant_pool[{}]", index),
            };
            let operands: Vec<String> = payload.chunks(2).map(|c| c.iter().map(|b| format!("{:02x}", b)).collect()).collect();
            let constant = if tag == CONSTANT_CLASS { Constant::Class(u16::from_be_bytes([payload[0], payload[1]])) } else { Constant::Other };
            (1 + size, format!("constant_pool[{}]: {} {}", index, tag_name(tag), operands.join(" ")), constant)
        };
        self.span(sink, len, description)?;
        self.pool.set(index as usize, constant);
        Ok(tag == CONSTANT_LONG || tag == CONSTANT_DOUBLE)
    }

    fn attributes(&mut self, sink: &mut EventSink<'_>) -> Result<(), HexError>
    {
        let count = self.u2(sink, "attributes_count")?;
        sink(ParseEvent::ChangeIndent(1))?;
        for i in 0..count
        {
            self.attribute(sink, i)?;
        }
        sink(ParseEvent::ChangeIndent(-1))
    }

    fn attribute(&mut self, sink: &mut EventSink<'_>, index: u16) -> Result<(), HexError>
    {
        let name_idx = peek_u2(self.bytes, self.ix)?;
        let len = peek_u4(self.bytes, self.ix + 2)? as usize;
        let name = self.pool.utf8_or_index(name_idx).into_owned();
        self.span(sink, 6, format!("attribute[{}]: {} length {}", index, name, len))?;
        sink(ParseEvent::ChangeIndent(1))?;
        let end = self.ix + len;
        if name == "Code"
        {
            self.code(sink)?;
            if self.ix > end
            {
                fail!(Format, "Code attribute overruns its length of {} bytes", len);
            }
            if self.ix < end
            {
                self.span(sink, end - self.ix, "unparsed Code bytes".to_string())?;
            }
        }
        else
        {
            self.span(sink, len, format!("{} info", name))?;
        }
        sink(ParseEvent::ChangeIndent(-1))
    }

    fn code(&mut self, sink: &mut EventSink<'_>) -> Result<(), HexError>
    {
        self.u2(sink, "max_stack")?;
        self.u2(sink, "max_locals")?;
        let code_len = peek_u4(self.bytes, self.ix)? as usize;
        self.span(sink, 4, format!("code_length: {}", code_len))?;
        self.span(sink, code_len, "code".to_string())?;
        let handlers = self.u2(sink, "exception_table_length")?;
        for i in 0..handlers
        {
            self.span(sink, 8, format!("exception_table[{}]", i))?;
        }
        self.attributes(sink)
    }

    fn member(&mut self, sink: &mut EventSink<'_>, kind: MemberKind) -> Result<(), HexError>
    {
        let start = self.ix;
        let access = peek_u2(self.bytes, start)?;
        let name = self.pool.utf8_or_index(peek_u2(self.bytes, start + 2)?).into_owned();
        let descriptor = self.pool.utf8_or_index(peek_u2(self.bytes, start + 4)?).into_owned();
        let context = match kind
        {
            MemberKind::Field => FlagContext::Field,
            MemberKind::Method => FlagContext::Method,
        };

        sink(ParseEvent::StartMember { offset: start, name: name.clone(), descriptor: descriptor.clone() })?;
        sink(ParseEvent::ChangeIndent(1))?;
        self.span(sink, 2, format!("access_flags: {}", AccessFlags::describe(access, context)))?;
        self.span(sink, 2, format!("name: {}", name))?;
        self.span(sink, 2, format!("descriptor: {}", descriptor))?;
        self.attributes(sink)?;
        sink(ParseEvent::ChangeIndent(-1))?;
        sink(ParseEvent::EndMember { offset: self.ix, name, descriptor, member: kind })
    }

    fn members(&mut self, sink: &mut EventSink<'_>, kind: MemberKind) -> Result<(), HexError>
    {
        let label = match kind
        {
            MemberKind::Field => "fields_count",
            MemberKind::Method => "methods_count",
        };
        let count = self.u2(sink, label)?;
        for _ in 0..count
        {
            self.member(sink, kind)?;
        }
        Ok(())
    }
}

impl StructureParser for ClassFileWalker<'_>
{
    fn walk(&mut self, sink: &mut EventSink<'_>) -> Result<(), HexError>
    {
        self.ix = 0;
        let magic = peek_u4(self.bytes, 0)?;
        if magic != CLASS_FILE_MAGIC
        {
            warn!("class file magic is {:08x}", magic);
        }
        self.span(sink, 4, format!("magic: {:08x}", magic))?;
        self.u2(sink, "minor_version")?;
        self.u2(sink, "major_version")?;

        let count = self.u2(sink, "constant_pool_count")?;
        self.pool = ConstantPool::with_count(count);
        sink(ParseEvent::ChangeIndent(1))?;
        let mut index = 1u32;
        while index < count as u32
        {
            let wide = self.constant(sink, index as u16)?;
            index += if wide { 2 } else { 1 };
        }
        sink(ParseEvent::ChangeIndent(-1))?;

        let access = peek_u2(self.bytes, self.ix)?;
        self.span(sink, 2, format!("access_flags: {}", AccessFlags::describe(access, FlagContext::Class)))?;
        let this_class = peek_u2(self.bytes, self.ix)?;
        self.span(sink, 2, format!("this_class: {}", self.pool.class_name(this_class)))?;
        let super_class = peek_u2(self.bytes, self.ix)?;
        self.span(sink, 2, format!("super_class: {}", self.pool.class_name(super_class)))?;

        let interfaces = self.u2(sink, "interfaces_count")?;
        sink(ParseEvent::ChangeIndent(1))?;
        for i in 0..interfaces
        {
            let iface = peek_u2(self.bytes, self.ix)?;
            self.span(sink, 2, format!("interfaces[{}]: {}", i, self.pool.class_name(iface)))?;
        }
        sink(ParseEvent::ChangeIndent(-1))?;

        self.members(sink, MemberKind::Field)?;
        self.members(sink, MemberKind::Method)?;
        self.attributes(sink)?;

        if self.ix < self.bytes.len()
        {
            warn!("{} trailing bytes after the last class attribute", self.bytes.len() - self.ix);
            self.span(sink, self.bytes.len() - self.ix, "trailing bytes".to_string())?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn u2(v: &mut Vec<u8>, x: u16) { v.extend_from_slice(&x.to_be_bytes()); }
    fn utf8(v: &mut Vec<u8>, s: &str) { v.push(1); u2(v, s.len() as u16); v.extend_from_slice(s.as_bytes()); }

    /// A minimal class `p/Foo` with one field `n:I`, one method `run()V` with a Code attribute, and a long constant.
    pub(crate) fn sample_class() -> Vec<u8>
    {
        let mut v = vec![0xca, 0xfe, 0xba, 0xbe];
        u2(&mut v, 0);
        u2(&mut v, 50);
        u2(&mut v, 12); // constant_pool_count
        utf8(&mut v, "p/Foo");            // 1
        v.push(7); u2(&mut v, 1);          // 2 Class p/Foo
        utf8(&mut v, "java/lang/Object"); // 3
        v.push(7); u2(&mut v, 3);          // 4 Class java/lang/Object
        utf8(&mut v, "n");                 // 5
        utf8(&mut v, "I");                 // 6
        utf8(&mut v, "run");               // 7
        utf8(&mut v, "()V");               // 8
        v.push(5); v.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 42]); // 9-10 Long
        utf8(&mut v, "Code");              // 11
        // access_flags, this, super, interfaces
        u2(&mut v, 0x0021);
        u2(&mut v, 2);
        u2(&mut v, 4);
        u2(&mut v, 0);
        // fields
        u2(&mut v, 1);
        u2(&mut v, 0x0002); u2(&mut v, 5); u2(&mut v, 6); u2(&mut v, 0);
        // methods
        u2(&mut v, 1);
        u2(&mut v, 0x0001); u2(&mut v, 7); u2(&mut v, 8); u2(&mut v, 1);
        u2(&mut v, 11); v.extend_from_slice(&13u32.to_be_bytes());
        u2(&mut v, 1); u2(&mut v, 1); v.extend_from_slice(&1u32.to_be_bytes()); v.push(0xb1);
        u2(&mut v, 0); u2(&mut v, 0);
        // class attributes
        u2(&mut v, 0);
        v
    }

    fn walk(bytes: &[u8]) -> Result<Vec<String>, HexError>
    {
        let mut seen = vec![];
        let mut walker = ClassFileWalker::new(bytes);
        walker.walk(&mut |e: ParseEvent<'_>| {
            seen.push(match e
            {
                ParseEvent::ChangeIndent(d) => format!("indent {}", d),
                ParseEvent::StartMember { name, descriptor, .. } => format!("start {}:{}", name, descriptor),
                ParseEvent::EndMember { name, member, .. } => format!("end {} {:?}", name, member),
                ParseEvent::Parsed { bytes, description, .. } => format!("{} [{}]", description, bytes.len()),
            });
            Ok(())
        })?;
        Ok(seen)
    }

    #[test]
    fn walks_every_byte() {
        let bytes = sample_class();
        let mut total = 0;
        let mut walker = ClassFileWalker::new(&bytes);
        walker.walk(&mut |e: ParseEvent<'_>| {
            if let ParseEvent::Parsed { offset, bytes, .. } = e
            {
                assert_eq!(offset, total);
                total += bytes.len();
            }
            Ok(())
        }).unwrap();
        assert_eq!(total, bytes.len());
    }

    #[test]
    fn reports_members_and_constants() {
        let seen = walk(&sample_class()).unwrap();
        assert!(seen.contains(&"start n:I".to_string()));
        assert!(seen.contains(&"end run Method".to_string()));
        assert!(seen.contains(&"this_class: p/Foo [2]".to_string()));
        assert!(seen.contains(&"access_flags: public super [2]".to_string()));
        assert!(seen.contains(&"constant_pool[9]: Long 0000 0000 0000 002a [9]".to_string()), "{seen:?}");
        assert!(!seen.iter().any(|s| s.starts_with("constant_pool[10]")));
        assert!(seen.contains(&"attribute[0]: Code length 13 [6]".to_string()));
        assert!(seen.contains(&"code [1]".to_string()));
    }

    #[test]
    fn trailing_bytes_are_kept() {
        let mut bytes = sample_class();
        bytes.extend_from_slice(&[0xde, 0xad]);
        let seen = walk(&bytes).unwrap();
        assert_eq!(seen.last().unwrap(), "trailing bytes [2]");
    }

    #[test]
    fn truncated_input_is_a_format_error() {
        let bytes = sample_class();
        let e = walk(&bytes[..bytes.len() - 4]).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Format);
    }
}
