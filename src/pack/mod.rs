//! LZW compression (pack) implementation
//!
//! Variable-width codes starting at 9 bits, a full dictionary reset once
//! the code space fills, and segment framing at every reset so the decoder
//! can refill a fixed buffer without scanning the stream.

mod dict;
mod writer;

pub use writer::PackWriter;

use crate::common::{LzwError, MaxBits, Result};

/// Compress a byte slice in memory.
///
/// The slice length is recorded in the container header, so inputs beyond
/// the 32-bit size field are refused.
pub fn pack_bytes(data: &[u8], max_bits: MaxBits) -> Result<Vec<u8>> {
    let input_size = u32::try_from(data.len())
        .map_err(|_| LzwError::InputTooLarge(data.len() as u64))?;
    let mut output = Vec::new();
    let writer = PackWriter::new(&mut output, max_bits)?;
    let mut input = data;
    writer.pack(&mut input, input_size)?;
    Ok(output)
}
