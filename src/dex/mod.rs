pub mod walker;

use adler::adler32_slice;
use log::debug;
use sha1::{Digest, Sha1};

use crate::error::HexError;
use crate::text::IntegrityFlags;

/* Header layout */
pub const DEX_FILE_MAGIC_PREFIX: [u8; 4] = [0x64, 0x65, 0x78, 0x0a];
pub const CHECKSUM_OFFSET: usize = 8;
pub const SIGNATURE_OFFSET: usize = 12;
pub const SIGNATURE_SIZE: usize = 20;
pub const SIGNED_DATA_OFFSET: usize = SIGNATURE_OFFSET + SIGNATURE_SIZE;
pub const HEADER_SIZE: usize = 0x70;
pub const ENDIAN_CONSTANT: u32 = 0x12345678;

// Dex files are little-endian throughout
pub(crate) fn read_u2(bytes: &[u8], ix: &mut usize) -> Option<u16>
{
    let b = bytes.get(*ix..*ix + 2)?;
    *ix += 2;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

pub(crate) fn read_u4(bytes: &[u8], ix: &mut usize) -> Option<u32>
{
    let b = bytes.get(*ix..*ix + 4)?;
    *ix += 4;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn write_u4(buffer: &mut [u8], ix: usize, val: u32)
{
    buffer[ix..ix + 4].copy_from_slice(&val.to_le_bytes());
}

/// SHA-1 of everything after the signature field.
pub fn compute_signature(dex: &[u8]) -> Result<[u8; SIGNATURE_SIZE], HexError>
{
    if dex.len() < SIGNED_DATA_OFFSET
    {
        fail!(Format, "dex buffer of {} bytes is too short to hold a signature", dex.len());
    }
    let digest = Sha1::digest(&dex[SIGNED_DATA_OFFSET..]);
    match <[u8; SIGNATURE_SIZE]>::try_from(digest.as_slice())
    {
        Ok(signature) => Ok(signature),
        Err(_) => fail!(Internal, "SHA-1 digest is {} bytes, expected {}", digest.len(), SIGNATURE_SIZE),
    }
}

/// Adler-32 of everything after the checksum field.
pub fn compute_checksum(dex: &[u8]) -> Result<u32, HexError>
{
    if dex.len() < SIGNATURE_OFFSET
    {
        fail!(Format, "dex buffer of {} bytes is too short to hold a checksum", dex.len());
    }
    Ok(adler32_slice(&dex[SIGNATURE_OFFSET..]))
}

/// Recomputes the signature and then the checksum, skipping whichever `flags` say to leave alone.
pub fn fix_integrity_fields(dex: &mut [u8], flags: IntegrityFlags) -> Result<(), HexError>
{
    if !flags.leave_signature
    {
        let signature = compute_signature(dex)?;
        dex[SIGNATURE_OFFSET..SIGNED_DATA_OFFSET].copy_from_slice(&signature);
        debug!("dex signature set to {}", signature.iter().map(|b| format!("{:02x}", b)).collect::<String>());
    }
    // The checksum covers the signature, so it goes second
    if !flags.leave_checksum
    {
        let checksum = compute_checksum(dex)?;
        write_u4(dex, CHECKSUM_OFFSET, checksum);
        debug!("dex checksum set to {:08x}", checksum);
    }
    Ok(())
}
