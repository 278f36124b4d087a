//! LZW decompression (unpack) implementation
//!
//! Reads the self-describing container: header, then length-prefixed
//! segments of packed codes. Each segment restarts the code width at 9
//! bits; the prefix/suffix tables rebuild the encoder's dictionary as
//! codes arrive.

mod reader;
mod segment;

pub use reader::UnpackReader;

use crate::common::Result;
use std::io::Cursor;

/// Decompress a byte slice in memory.
pub fn unpack_bytes(data: &[u8]) -> Result<Vec<u8>> {
    let reader = UnpackReader::new(Cursor::new(data))?;
    let mut output = Vec::new();
    reader.unpack(&mut output)?;
    Ok(output)
}
