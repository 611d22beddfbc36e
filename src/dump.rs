/* Renders structural walk events into the annotated hex text format */

use log::warn;
use std::io::Write;

use crate::class::ClassFileWalker;
use crate::dex::walker::{DexDumpOptions, DexWalker};
use crate::error::HexError;
use crate::events::{MemberKind, ParseEvent, StructureParser};
use crate::text::{class_header_line, dex_header_line, dotted_name, hex_line, indent_prefix, printable_line};

/// State threaded through one dump: the bytes being dumped, how far the
/// rendered spans have got, and the current indentation.
pub struct DumpContext<'a, W: Write>
{
    master: &'a [u8],
    cursor: usize,
    indent: usize,
    out: W,
}

impl<'a, W: Write> DumpContext<'a, W>
{
    pub fn new(master: &'a [u8], out: W) -> Self
    {
        DumpContext { master, cursor: 0, indent: 0, out }
    }

    /// Number of bytes rendered and checked so far.
    pub fn cursor(&self) -> usize
    {
        self.cursor
    }

    pub fn into_inner(self) -> W
    {
        self.out
    }

    fn line(&mut self, text: &str) -> Result<(), HexError>
    {
        writeln!(self.out, "{}{}", indent_prefix(self.indent), text)?;
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<(), HexError>
    {
        for l in text.lines()
        {
            self.line(&format!("// {}", l))?;
        }
        Ok(())
    }

    /// Writes a line ahead of any event output.
    pub fn header(&mut self, text: &str) -> Result<(), HexError>
    {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    pub fn handle(&mut self, event: ParseEvent<'_>) -> Result<(), HexError>
    {
        match event
        {
            ParseEvent::ChangeIndent(delta) => {
                let level = self.indent as i64 + delta as i64;
                if level < 0
                {
                    fail!(Internal, "indentation dropped below zero at byte {}", self.cursor);
                }
                self.indent = level as usize;
            }
            ParseEvent::StartMember { offset, name, descriptor } => {
                self.comment(&format!("{}:{} @{:04x}", name, descriptor, offset))?;
            }
            ParseEvent::EndMember { offset, name, descriptor, member } => {
                let kind = match member
                {
                    MemberKind::Field => "field",
                    MemberKind::Method => "method",
                };
                self.comment(&format!("end {} {}:{} @{:04x}", kind, name, descriptor, offset))?;
            }
            ParseEvent::Parsed { offset, bytes, description } => {
                self.check_span(offset, bytes)?;
                if !bytes.is_empty()
                {
                    self.comment(&format!("@{:04x} len {}: {}", offset, bytes.len(), description))?;
                    self.comment(&printable_line(bytes))?;
                    self.line(&hex_line(bytes))?;
                }
                self.cursor += bytes.len();
            }
        }
        Ok(())
    }

    /// Every reported span must start at the running cursor and match the dumped bytes there.
    fn check_span(&self, offset: usize, bytes: &[u8]) -> Result<(), HexError>
    {
        if offset != self.cursor
        {
            fail!(Internal, "walker reported offset {} but the dump is at byte {}", offset, self.cursor);
        }
        for (i, b) in bytes.iter().enumerate()
        {
            let pos = self.cursor + i;
            match self.master.get(pos)
            {
                Some(m) if m == b => {}
                Some(m) => fail!(Internal, "walker reported {:02x} but byte {} is {:02x}", b, pos, m),
                None => fail!(Internal, "walker reported byte {} past the end of {} bytes", pos, self.master.len()),
            }
        }
        Ok(())
    }
}

/// Dumps `bytes` with any walker, writing `headers` first.
pub fn dump_with<W: Write>(bytes: &[u8], headers: &[String], parser: &mut dyn StructureParser, out: W) -> Result<W, HexError>
{
    let mut ctx = DumpContext::new(bytes, out);
    for h in headers
    {
        ctx.header(h)?;
    }
    parser.walk(&mut |event: ParseEvent<'_>| ctx.handle(event))?;
    if ctx.cursor() != bytes.len()
    {
        warn!("dump covered {} of {} bytes", ctx.cursor(), bytes.len());
    }
    let mut out = ctx.into_inner();
    out.flush()?;
    Ok(out)
}

/// Dumps a class file. `logical_path` is the class or source path used for the `//@class:` line.
pub fn dump_class<W: Write>(bytes: &[u8], logical_path: &str, out: W) -> Result<W, HexError>
{
    let headers = vec![class_header_line(&dotted_name(logical_path))];
    let mut walker = ClassFileWalker::new(bytes);
    dump_with(bytes, &headers, &mut walker, out)
}

/// Dumps a dex file. Line 2 carries the integrity markers requested in `options`.
pub fn dump_dex<W: Write>(bytes: &[u8], name: &str, options: &DexDumpOptions, out: W) -> Result<W, HexError>
{
    let headers = vec![dex_header_line(name), options.flags.marker_line()];
    let mut walker = DexWalker::new(bytes, options.row_width);
    dump_with(bytes, &headers, &mut walker, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    struct Scripted<'b>
    {
        bytes: &'b [u8],
        spans: Vec<(usize, usize)>,
    }

    impl StructureParser for Scripted<'_>
    {
        fn walk(&mut self, sink: &mut crate::events::EventSink<'_>) -> Result<(), HexError>
        {
            sink(ParseEvent::ChangeIndent(1))?;
            for &(off, len) in &self.spans
            {
                sink(ParseEvent::parsed(off, &self.bytes[off..off + len], "span"))?;
            }
            sink(ParseEvent::ChangeIndent(-1))
        }
    }

    #[test]
    fn renders_spans_with_indent() {
        let bytes = [0x41u8, 0x42, 0x00];
        let mut p = Scripted { bytes: &bytes, spans: vec![(0, 2), (2, 0), (2, 1)] };
        let out = dump_with(&bytes, &["//@class:T".to_string()], &mut p, Vec::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "//@class:T");
        assert_eq!(lines[1], "    // @0000 len 2: span");
        assert_eq!(lines[2], "    // A  B  ");
        assert_eq!(lines[3], "    41 42");
        assert_eq!(lines[4], "    // @0002 len 1: span");
        assert_eq!(lines[6], "    00");
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn skipped_bytes_are_fatal() {
        let bytes = [0x01u8, 0x02, 0x03];
        let mut p = Scripted { bytes: &bytes, spans: vec![(0, 1), (2, 1)] };
        let e = dump_with(&bytes, &[], &mut p, Vec::new()).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Internal);
        assert!(e.to_string().contains("byte 1"), "{e}");
    }

    #[test]
    fn differing_bytes_are_fatal() {
        let walked = [0x01u8, 0x09];
        let master = [0x01u8, 0x02];
        let mut p = Scripted { bytes: &walked, spans: vec![(0, 2)] };
        let e = dump_with(&master, &[], &mut p, Vec::new()).unwrap_err();
        assert!(e.is_internal());
        assert!(e.to_string().contains("byte 1 is 02"), "{e}");
    }

    #[test]
    fn spans_past_the_end_are_fatal() {
        let walked = [0x01u8, 0x02];
        let master = [0x01u8];
        let mut p = Scripted { bytes: &walked, spans: vec![(0, 2)] };
        let e = dump_with(&master, &[], &mut p, Vec::new()).unwrap_err();
        assert!(e.is_internal());
    }

    #[test]
    fn misplaced_offset_is_fatal() {
        // Same bytes as at the cursor, but the walker claims a different position
        let master = [0u8; 4];
        let mut ctx = DumpContext::new(&master, Vec::new());
        ctx.handle(ParseEvent::parsed(0, &master[..2], "padding")).unwrap();
        let e = ctx.handle(ParseEvent::parsed(3, &master[2..3], "padding")).unwrap_err();
        assert!(e.is_internal());
        assert!(e.to_string().contains("offset 3"), "{e}");
        assert_eq!(ctx.cursor(), 2);
    }

    #[test]
    fn member_lines() {
        let mut ctx = DumpContext::new(&[], Vec::new());
        ctx.handle(ParseEvent::StartMember { offset: 0x20, name: "run".into(), descriptor: "()V".into() }).unwrap();
        ctx.handle(ParseEvent::EndMember { offset: 0x30, name: "run".into(), descriptor: "()V".into(), member: MemberKind::Method }).unwrap();
        let text = String::from_utf8(ctx.into_inner()).unwrap();
        assert_eq!(text, "// run:()V @0020\n// end method run:()V @0030\n");
    }
}
