/* File level entry points: dump a compiled class or a dex file, reassemble a .cfh/.dfh file */

use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::assemble::assemble;
use crate::dex::walker::DexDumpOptions;
use crate::dump::{dump_class, dump_dex};
use crate::error::{Context, HexError};
use crate::text::{DocumentKind, CLASS_TEXT_EXTENSION};

/// Writes `contents` to `path` via a temporary file in the same directory, creating parents as needed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), HexError>
{
    let dir = match path.parent()
    {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| HexError::io(e, dir))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| HexError::io(e, dir))?;
    tmp.write_all(contents).map_err(|e| HexError::io(e, tmp.path()))?;
    tmp.persist(path).map_err(|e| HexError::io(e.error, path))?;
    info!("wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Dumps the compiled class for `source_file` into a `.cfh` file next to it.
///
/// The class is looked up at the same relative location under `classes_root`
/// as `source_file` has under `source_root`.
pub fn dump_source(source_root: &Path, classes_root: &Path, source_file: &Path) -> Result<PathBuf, HexError>
{
    let relative = match source_file.strip_prefix(source_root)
    {
        Ok(r) => r,
        Err(_) => fail!(Format, "{} is not under {}", source_file.display(), source_root.display()),
    };
    let logical = relative.to_string_lossy().replace('\\', "/");
    let stem = logical.strip_suffix(".java").unwrap_or(&logical);
    let compiled = classes_root.join(format!("{}.class", stem));

    let bytes = fs::read(&compiled).map_err(|e| HexError::io(e, &compiled))?;
    let text = dump_class(&bytes, &logical, Vec::new()).context(compiled.display())?;

    let output = source_file.with_extension(CLASS_TEXT_EXTENSION);
    write_atomic(&output, &text)?;
    Ok(output)
}

/// Dumps a dex file into the `.dfh` file `output`.
pub fn dump_dex_file(dex_file: &Path, output: &Path, options: &DexDumpOptions) -> Result<(), HexError>
{
    let bytes = fs::read(dex_file).map_err(|e| HexError::io(e, dex_file))?;
    let text = dump_dex(&bytes, &dex_file.display().to_string(), options, Vec::new()).context(dex_file.display())?;
    write_atomic(output, &text)
}

/// Reassembles a `.cfh` or `.dfh` file under `output_base`, returning the path written.
pub fn reassemble_file(input: &Path, output_base: &Path) -> Result<PathBuf, HexError>
{
    let kind = DocumentKind::from_path(input)?;
    // Comments may carry stray non-UTF-8 bytes; a bad data token still fails in decoding
    let raw = fs::read(input).map_err(|e| HexError::io(e, input))?;
    let text = String::from_utf8_lossy(&raw);
    let assembled = assemble(&text, kind, &input.display().to_string(), output_base)?;
    write_atomic(&assembled.output_path, &assembled.bytes)?;
    Ok(assembled.output_path)
}
