/* Turns annotated hex text back into class or dex bytes */

use log::debug;
use std::path::{Path, PathBuf};

use crate::dex::fix_integrity_fields;
use crate::error::{Context, HexError};
use crate::text::{decode_data_line, resolve_output_path, DocumentKind, IntegrityFlags};

/// The result of reassembling one document: the bytes and where they belong.
#[derive(Debug, PartialEq, Eq)]
pub struct Assembled
{
    pub bytes: Vec<u8>,
    pub output_path: PathBuf,
    /// Integrity markers found on line 2, always default for class documents.
    pub flags: IntegrityFlags,
}

/// Reassembles `text`. `origin` names the document in error messages.
pub fn assemble(text: &str, kind: DocumentKind, origin: &str, output_base: &Path) -> Result<Assembled, HexError>
{
    let mut lines = text.lines();
    let header = lines.next().unwrap_or("");

    let mut bytes = vec![];
    let mut flags = IntegrityFlags::default();
    for (n, line) in std::iter::once(header).chain(lines).enumerate()
    {
        if n == 1 && kind.is_dex()
        {
            flags = IntegrityFlags::from_marker_line(line);
            debug!("{}: leave checksum {}, leave signature {}", origin, flags.leave_checksum, flags.leave_signature);
        }
        decode_data_line(line, &mut bytes).context(format!("line {}", n + 1)).context(origin)?;
    }

    if kind.is_dex()
    {
        fix_integrity_fields(&mut bytes, flags).context(origin)?;
    }

    let output_path = resolve_output_path(header, kind, output_base).context(origin)?;
    Ok(Assembled { bytes, output_path, flags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn class_bytes_and_path() {
        let text = "//@class:com/example/Foo\n// magic\nca fe ba be\n\n  00 01  \n// 99 99\n";
        let a = assemble(text, DocumentKind::Class, "Foo.cfh", Path::new("out")).unwrap();
        assert_eq!(a.bytes, vec![0xca, 0xfe, 0xba, 0xbe, 0x00, 0x01]);
        assert_eq!(a.output_path, Path::new("out/com/example/Foo.class"));
        assert_eq!(a.flags, IntegrityFlags::default());
    }

    #[test]
    fn class_documents_ignore_markers() {
        let text = "//@class:Foo\n//@leaveChecksum\n01\n";
        let a = assemble(text, DocumentKind::Class, "Foo.cfh", Path::new("out")).unwrap();
        assert_eq!(a.flags, IntegrityFlags::default());
    }

    #[test]
    fn bad_token_names_line_and_file() {
        let text = "//@class:Foo\n00 01\n02 xy\n";
        let e = assemble(text, DocumentKind::Class, "Foo.cfh", Path::new("out")).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Format);
        assert_eq!(e.to_string(), "format error: invalid hex byte 'xy' for line 3 of Foo.cfh");
    }

    #[test]
    fn wrong_header_is_a_format_error() {
        let e = assemble("//@wrong:Foo\n00\n", DocumentKind::Class, "Foo.cfh", Path::new("out")).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Format);
        assert!(e.to_string().contains("Foo.cfh"));
    }

    #[test]
    fn empty_document_has_no_header() {
        let e = assemble("", DocumentKind::Dex, "x.dfh", Path::new("out")).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::Format);
    }

    #[test]
    fn dex_fields_are_recomputed() {
        let body: Vec<String> = (0u8..40).map(|b| format!("{:02x}", b)).collect();
        let text = format!("// Processing 'x.dex'...\n//\n{}\n", body.join(" "));
        let a = assemble(&text, DocumentKind::Dex, "x.dfh", Path::new("out")).unwrap();
        assert_eq!(a.output_path, Path::new("out/classes.dex"));
        let original: Vec<u8> = (0u8..40).collect();
        assert_eq!(&a.bytes[..8], &original[..8]);
        assert_eq!(&a.bytes[32..], &original[32..]);
        assert_ne!(&a.bytes[8..32], &original[8..32]);
    }
}
