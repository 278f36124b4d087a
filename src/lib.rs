//! lzwpack - variable-width LZW compression with a self-describing container
//!
//! This crate implements a lossless byte-stream compressor built on
//! Lempel-Ziv-Welch coding with codes that grow from 9 bits up to a
//! configurable maximum (9 to 15), a full dictionary reset whenever the
//! code space fills, and a framed on-disk format: an `LZW\0` header that
//! records the code width and the exact input size, followed by
//! length-prefixed segments that let the decoder refill a fixed buffer
//! without scanning ahead.
//!
//! # Features
//!
//! - Exact round-trip: the decoder reproduces the encoder's input byte for
//!   byte and verifies the length declared in the header
//! - Code widths 9 through 15 on compression; streams from the 16-bit
//!   encoder variant decode as well
//! - Streaming one-shot API over `Read`/`Write`, plus in-memory and
//!   file-path helpers
//! - Optional async wrappers behind the `async` feature
//!
//! # Example - in memory
//!
//! ```
//! use lzwpack::{pack_bytes, unpack_bytes, MaxBits};
//!
//! let data = b"TOBEORNOTTOBEORTOBEORNOT";
//! let packed = pack_bytes(data, MaxBits::DEFAULT)?;
//! let unpacked = unpack_bytes(&packed)?;
//! assert_eq!(unpacked, data);
//! # Ok::<(), lzwpack::LzwError>(())
//! ```
//!
//! # Example - files
//!
//! ```no_run
//! use lzwpack::{pack_file, unpack_file, MaxBits, Options};
//!
//! let stats = pack_file("input.bin", "input.lzw", Options::default(), MaxBits::DEFAULT)?;
//! println!("packed to {:.2}% of original", stats.ratio());
//!
//! let opts = Options { overwrite: true, ..Options::default() };
//! unpack_file("input.lzw", "restored.bin", opts)?;
//! # Ok::<(), lzwpack::LzwError>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod common;
pub mod crc32;
pub mod error;
pub mod pack;
pub mod unpack;

#[cfg(feature = "async")]
pub mod async_convenience;

pub use common::{
    CodecStats, Header, LzwError, MaxBits, Options, Result, CHUNK_SIZE, DEFAULT_MAX_BITS,
    FORMAT_VERSION, HEADER_LEN, MAGIC, MAX_PACK_BITS, MAX_UNPACK_BITS, MIN_CODE_BITS,
};
pub use crc32::cksum;
pub use pack::{pack_bytes, PackWriter};
pub use unpack::{unpack_bytes, UnpackReader};

#[cfg(feature = "async")]
pub use async_convenience::*;

use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Compress `input` into `output`, recording the input size in the header.
///
/// On failure the partial output file is removed unless
/// [`Options::keep_on_error`] is set. Inputs larger than the 32-bit size
/// field are refused.
pub fn pack_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    opts: Options,
    max_bits: MaxBits,
) -> Result<CodecStats> {
    let mut created = false;
    let result = pack_file_inner(input.as_ref(), output.as_ref(), opts, max_bits, &mut created);
    if result.is_err() && created && !opts.keep_on_error {
        let _ = std::fs::remove_file(output.as_ref());
    }
    result
}

fn pack_file_inner(
    input: &Path,
    output: &Path,
    opts: Options,
    max_bits: MaxBits,
    created: &mut bool,
) -> Result<CodecStats> {
    let file = File::open(input).map_err(|e| LzwError::Open {
        path: input.to_path_buf(),
        source: e,
    })?;
    let input_bytes = file.metadata().map_err(LzwError::Read)?.len();
    let input_size =
        u32::try_from(input_bytes).map_err(|_| LzwError::InputTooLarge(input_bytes))?;

    let out = File::create(output).map_err(|e| LzwError::Open {
        path: output.to_path_buf(),
        source: e,
    })?;
    *created = true;

    let mut reader = BufReader::new(file);
    let writer = PackWriter::new(BufWriter::new(out), max_bits)?;
    let mut sink = writer.pack(&mut reader, input_size)?;
    sink.flush().map_err(LzwError::Write)?;

    let output_bytes = std::fs::metadata(output).map_err(LzwError::Read)?.len();
    let stats = CodecStats {
        input_bytes,
        output_bytes,
    };
    if opts.verbose {
        info!(
            "packed {} -> {} bytes ({:.2}%)",
            stats.input_bytes,
            stats.output_bytes,
            stats.ratio()
        );
    }
    Ok(stats)
}

/// Decompress `input` into `output`.
///
/// Refuses to replace an existing output unless [`Options::overwrite`] is
/// set. On failure a partially written output is removed unless
/// [`Options::keep_on_error`] is set; a pre-existing file that was refused
/// is never touched.
pub fn unpack_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    opts: Options,
) -> Result<CodecStats> {
    let (input, output) = (input.as_ref(), output.as_ref());
    if !opts.overwrite && output.exists() {
        return Err(LzwError::OutputExists(output.to_path_buf()));
    }

    let mut created = false;
    let result = unpack_file_inner(input, output, opts, &mut created);
    if result.is_err() && created && !opts.keep_on_error {
        let _ = std::fs::remove_file(output);
    }
    result
}

fn unpack_file_inner(
    input: &Path,
    output: &Path,
    opts: Options,
    created: &mut bool,
) -> Result<CodecStats> {
    let file = File::open(input).map_err(|e| LzwError::Open {
        path: input.to_path_buf(),
        source: e,
    })?;
    let input_bytes = file.metadata().map_err(LzwError::Read)?.len();

    let reader = UnpackReader::new(BufReader::new(file))?;

    let out = File::create(output).map_err(|e| LzwError::Open {
        path: output.to_path_buf(),
        source: e,
    })?;
    *created = true;
    let mut writer = BufWriter::new(out);
    let output_bytes = reader.unpack(&mut writer)?;
    writer.flush().map_err(LzwError::Write)?;

    let stats = CodecStats {
        input_bytes,
        output_bytes,
    };
    if opts.verbose {
        info!(
            "unpacked {} -> {} bytes",
            stats.input_bytes, stats.output_bytes
        );
    }
    Ok(stats)
}
