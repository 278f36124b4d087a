//! Common types and constants shared by the pack and unpack halves
//!
//! This module defines the container header, the option record, the code
//! width bookkeeping and the error type used throughout the crate.

use std::io::{self, Read, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Container magic: `'L' 'Z' 'W' '\0'`.
pub const MAGIC: [u8; 4] = *b"LZW\0";

/// Container format version written after the magic.
pub const FORMAT_VERSION: u8 = 0;

/// Total size of the fixed container header in bytes.
pub const HEADER_LEN: usize = 10;

/// Chunk size shared by the encoder input loop and the decoder staging
/// buffer. The encoder breaks its current run at every multiple of this
/// value and the decoder resets its previous-code tracking when the staging
/// buffer fills; the two boundaries must coincide, so both sides use this
/// one constant.
pub const CHUNK_SIZE: usize = 16384;

/// Smallest permitted maximum code width.
pub const MIN_CODE_BITS: u8 = 9;

/// Largest code width the encoder will produce.
pub const MAX_PACK_BITS: u8 = 15;

/// Largest code width the decoder accepts (files from the 16-bit encoder
/// variant decode fine; this encoder tops out at [`MAX_PACK_BITS`]).
pub const MAX_UNPACK_BITS: u8 = 16;

/// Default maximum code width for compression.
pub const DEFAULT_MAX_BITS: u8 = 15;

/// Sentinel for "no code": marks unallocated prefix slots and the absent
/// previous code at segment start.
pub(crate) const NO_CODE: u16 = 0xFFFF;

/// First dictionary code after the 256 literal byte codes.
pub(crate) const FIRST_FREE_CODE: u16 = 256;

/// Code width at the start of every segment and after every reset.
pub(crate) const INITIAL_CODE_BITS: u8 = 9;

/// End-of-stream code at the initial 9-bit width. Doubles-plus-one on every
/// width increase, so it is always an all-ones pattern and doubles as the
/// extraction mask.
pub(crate) const INITIAL_EOF_CODE: u16 = 511;

/// Info byte bit 0: set when the stream was written on a big-endian host.
pub(crate) const INFO_BIG_ENDIAN: u8 = 0x01;

/// Info byte bit 1: set when codes have variable width. Always set by this
/// encoder.
pub(crate) const INFO_VARIABLE_WIDTH: u8 = 0x02;

/// Maximum code width the encoder accepts, as a validated newtype.
///
/// The header stores `bits - 8` in its high nibble, so representable widths
/// run from 9 to 16; the encoder itself refuses anything above
/// [`MAX_PACK_BITS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxBits(u8);

impl MaxBits {
    /// Default width for compression (15 bits).
    pub const DEFAULT: Self = MaxBits(DEFAULT_MAX_BITS);

    /// Validate a width for compression. Accepts 9 through 15.
    pub fn for_pack(bits: u8) -> Result<Self> {
        if !(MIN_CODE_BITS..=MAX_PACK_BITS).contains(&bits) {
            return Err(LzwError::InvalidMaxBits(bits));
        }
        Ok(Self(bits))
    }

    /// Validate a width read from a container header. Accepts 9 through 16.
    pub fn for_unpack(bits: u8) -> Result<Self> {
        if !(MIN_CODE_BITS..=MAX_UNPACK_BITS).contains(&bits) {
            return Err(LzwError::UnsupportedMaxBits(bits));
        }
        Ok(Self(bits))
    }

    /// The raw width in bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Number of distinct codes, `2^bits`. Also the size of the decoder's
    /// prefix and suffix arrays.
    pub fn max_code(self) -> usize {
        1 << self.0
    }

    /// The reserved dictionary-reset code, `2^bits - 2`.
    pub fn clear_code(self) -> u16 {
        ((1u32 << self.0) - 2) as u16
    }

    /// Slot count of the encoder's hash table, `2^(bits+1)`. Twice the code
    /// space, fixing the load factor at 0.5.
    pub fn table_slots(self) -> usize {
        1 << (self.0 + 1)
    }

    /// The nibble stored in the header info byte.
    pub(crate) fn info_nibble(self) -> u8 {
        self.0 - 8
    }
}

/// Running code-width state, kept in lockstep by encoder and decoder.
///
/// `eof_code` is always `2^running_bits - 1`: it serves as the end-of-stream
/// code at the current width and as the bit mask for code extraction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WidthState {
    /// Next code to be assigned.
    pub run_code: u16,
    /// Current code width in bits.
    pub running_bits: u8,
    /// End-of-stream code at the current width; all-ones.
    pub eof_code: u16,
}

impl WidthState {
    pub fn new() -> Self {
        Self {
            run_code: FIRST_FREE_CODE,
            running_bits: INITIAL_CODE_BITS,
            eof_code: INITIAL_EOF_CODE,
        }
    }

    /// Back to the 9-bit state used at segment start and after a reset.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Account for one assigned code.
    pub fn bump(&mut self) {
        self.run_code += 1;
    }

    /// Grow the width when the code space at the current width is exhausted.
    /// Returns whether the width changed. Capped at [`MAX_UNPACK_BITS`] so a
    /// corrupt stream cannot push the width past what a `u16` code can hold.
    pub fn maybe_widen(&mut self) -> bool {
        if self.run_code == self.eof_code && self.running_bits < MAX_UNPACK_BITS {
            self.running_bits += 1;
            self.eof_code = (self.eof_code << 1) + 1;
            return true;
        }
        false
    }
}

/// Fixed container header preceding the segment stream.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    /// Maximum code width the stream was encoded with.
    pub max_bits: MaxBits,
    /// Exact byte length of the original input.
    pub input_size: u32,
}

impl Header {
    /// The info byte this host writes for the given width: endianness flag
    /// (always little-endian here), variable-width flag, width nibble.
    pub(crate) fn info_byte(max_bits: MaxBits) -> u8 {
        let mut info = 0u8;
        if cfg!(target_endian = "big") {
            info |= INFO_BIG_ENDIAN;
        }
        info |= INFO_VARIABLE_WIDTH;
        info | (max_bits.info_nibble() << 4)
    }

    /// Serialize the header: magic, version, info byte, little-endian size.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&MAGIC).map_err(LzwError::Write)?;
        writer.write_all(&[FORMAT_VERSION]).map_err(LzwError::Write)?;
        writer
            .write_all(&[Self::info_byte(self.max_bits)])
            .map_err(LzwError::Write)?;
        writer
            .write_all(&self.input_size.to_le_bytes())
            .map_err(LzwError::Write)?;
        Ok(())
    }

    /// Parse and validate a header. A short or mismatching magic is
    /// [`LzwError::BadMagic`]; only the low nibble of the info byte is
    /// compared against the host's expectation, the high nibble carries the
    /// width.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).map_err(|_| LzwError::BadMagic)?;
        if magic != MAGIC {
            return Err(LzwError::BadMagic);
        }

        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte).map_err(LzwError::Read)?;
        if byte[0] != FORMAT_VERSION {
            return Err(LzwError::VersionMismatch {
                expected: FORMAT_VERSION,
                actual: byte[0],
            });
        }

        reader.read_exact(&mut byte).map_err(LzwError::Read)?;
        let info = byte[0];
        let expected = Self::info_byte(MaxBits::DEFAULT) & 0x0F;
        if expected != info & 0x0F {
            return Err(LzwError::FlagsMismatch {
                expected,
                actual: info & 0x0F,
            });
        }

        let max_bits = MaxBits::for_unpack(8 + (info >> 4))?;

        let mut size = [0u8; 4];
        reader.read_exact(&mut size).map_err(LzwError::Read)?;

        Ok(Self {
            max_bits,
            input_size: u32::from_le_bytes(size),
        })
    }
}

/// Behavior switches for the file-level operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Retain a partial output file when the operation fails. The default is
    /// to remove it.
    pub keep_on_error: bool,
    /// Emit informational messages (sizes, ratio) at info level.
    pub verbose: bool,
    /// Unpack only: permit replacing an existing output file.
    pub overwrite: bool,
    /// Emit per-segment tracing at debug level. Advisory; never alters
    /// behavior.
    pub diagnostic: bool,
}

/// Byte counts reported by a completed pack or unpack operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecStats {
    /// Bytes consumed from the input file.
    pub input_bytes: u64,
    /// Bytes written to the output file.
    pub output_bytes: u64,
}

impl CodecStats {
    /// Output size as a fraction of input size (percent).
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        100.0 * self.output_bytes as f64 / self.input_bytes as f64
    }
}

/// Error type for all pack and unpack operations.
#[derive(Debug, Error)]
pub enum LzwError {
    /// Requested maximum code width outside the encoder's supported range.
    #[error("invalid maximum code width {0} (encoder supports {MIN_CODE_BITS} to {MAX_PACK_BITS})")]
    InvalidMaxBits(u8),

    /// The container's integer fields are little-endian; big-endian hosts
    /// are refused outright.
    #[error("not supported on big-endian hosts")]
    BigEndianHost,

    /// Input larger than the 32-bit size field can record.
    #[error("input of {0} bytes exceeds the container's 32-bit size field")]
    InputTooLarge(u64),

    /// A file could not be opened or created.
    #[error("cannot open '{path}': {source}")]
    Open {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Read failure on the input stream.
    #[error("read error: {0}")]
    Read(io::Error),

    /// Write failure on the output stream.
    #[error("write error (out of disk space?): {0}")]
    Write(io::Error),

    /// The stream does not start with the `LZW\0` magic.
    #[error("not an LZW container")]
    BadMagic,

    /// The stream was written by an incompatible format version.
    #[error("container version mismatch: expected {expected}, found {actual}")]
    VersionMismatch {
        /// Version this decoder understands.
        expected: u8,
        /// Version found in the stream.
        actual: u8,
    },

    /// The encoding flags in the info byte disagree with this decoder.
    #[error("encoding flags mismatch: expected {expected:#x}, found {actual:#x}")]
    FlagsMismatch {
        /// Low info nibble this decoder expects.
        expected: u8,
        /// Low info nibble found in the stream.
        actual: u8,
    },

    /// The header declares a maximum code width outside 9..=16.
    #[error("unsupported maximum code width {0}")]
    UnsupportedMaxBits(u8),

    /// A segment ended before its terminating code, or the stream was
    /// truncated mid-segment.
    #[error("unexpected end of compressed stream")]
    UnexpectedEof,

    /// The stream referenced a code with no allocated table entry.
    #[error("corrupt stream: invalid code {0}")]
    InvalidCode(u16),

    /// Decoded byte count disagrees with the size declared in the header.
    #[error("decoded size {actual} does not match declared size {expected}")]
    SizeMismatch {
        /// Size declared by the container header.
        expected: u64,
        /// Bytes actually decoded.
        actual: u64,
    },

    /// Unpack target already exists and overwrite was not requested.
    #[error("output file '{0}' already exists (use overwrite)")]
    OutputExists(PathBuf),

    /// A background task could not be joined.
    #[cfg(feature = "async")]
    #[error("async task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Result type alias for pack and unpack operations.
pub type Result<T> = std::result::Result<T, LzwError>;

/// Translate a `read_exact` failure: a clean EOF means the stream was
/// truncated, anything else is a plain read error.
pub(crate) fn read_error(e: io::Error) -> LzwError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        LzwError::UnexpectedEof
    } else {
        LzwError::Read(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_bits_ranges() {
        assert!(MaxBits::for_pack(8).is_err());
        assert!(MaxBits::for_pack(9).is_ok());
        assert!(MaxBits::for_pack(15).is_ok());
        assert!(MaxBits::for_pack(16).is_err());

        assert!(MaxBits::for_unpack(8).is_err());
        assert!(MaxBits::for_unpack(16).is_ok());
        assert!(MaxBits::for_unpack(17).is_err());
    }

    #[test]
    fn test_max_bits_derived_constants() {
        let bits = MaxBits::for_pack(12).unwrap();
        assert_eq!(bits.max_code(), 4096);
        assert_eq!(bits.clear_code(), 4094);
        assert_eq!(bits.table_slots(), 8192);
        assert_eq!(bits.info_nibble(), 4);

        let bits = MaxBits::for_pack(15).unwrap();
        assert_eq!(bits.max_code(), 32768);
        assert_eq!(bits.clear_code(), 32766);
        assert_eq!(bits.table_slots(), 65536);
    }

    #[test]
    fn test_width_growth_schedule() {
        let mut width = WidthState::new();
        assert_eq!((width.run_code, width.running_bits, width.eof_code), (256, 9, 511));

        // No growth until the code space is exhausted.
        while width.run_code < 511 {
            width.bump();
            if width.run_code < 511 {
                assert!(!width.maybe_widen());
            }
        }
        assert!(width.maybe_widen());
        assert_eq!((width.running_bits, width.eof_code), (10, 1023));

        // Each doubling point grows the width exactly once.
        width.run_code = 1023;
        assert!(width.maybe_widen());
        assert_eq!((width.running_bits, width.eof_code), (11, 2047));
        assert!(!width.maybe_widen());

        width.reset();
        assert_eq!((width.run_code, width.running_bits, width.eof_code), (256, 9, 511));
    }

    #[test]
    fn test_width_growth_capped() {
        let mut width = WidthState::new();
        width.running_bits = 16;
        width.eof_code = 0xFFFF;
        width.run_code = 0xFFFF;
        assert!(!width.maybe_widen());
        assert_eq!(width.running_bits, 16);
    }

    #[test]
    fn test_header_round_trip() {
        let header = Header {
            max_bits: MaxBits::for_pack(13).unwrap(),
            input_size: 0xDEAD_BEEF,
        };
        let mut raw = Vec::new();
        header.write_to(&mut raw).unwrap();
        assert_eq!(raw.len(), HEADER_LEN);
        assert_eq!(&raw[..4], b"LZW\0");
        assert_eq!(raw[4], FORMAT_VERSION);
        assert_eq!(raw[5], 0x02 | (5 << 4));
        assert_eq!(&raw[6..], &0xDEAD_BEEFu32.to_le_bytes());

        let parsed = Header::read_from(&mut &raw[..]).unwrap();
        assert_eq!(parsed.max_bits.bits(), 13);
        assert_eq!(parsed.input_size, 0xDEAD_BEEF);
    }

    #[test]
    fn test_header_rejects_tampering() {
        let header = Header {
            max_bits: MaxBits::DEFAULT,
            input_size: 42,
        };
        let mut raw = Vec::new();
        header.write_to(&mut raw).unwrap();

        let mut bad = raw.clone();
        bad[0] = b'X';
        assert!(matches!(Header::read_from(&mut &bad[..]), Err(LzwError::BadMagic)));

        let mut bad = raw.clone();
        bad[4] = 7;
        assert!(matches!(
            Header::read_from(&mut &bad[..]),
            Err(LzwError::VersionMismatch { actual: 7, .. })
        ));

        let mut bad = raw.clone();
        bad[5] ^= 0x01;
        assert!(matches!(
            Header::read_from(&mut &bad[..]),
            Err(LzwError::FlagsMismatch { .. })
        ));

        let mut bad = raw;
        bad[5] &= 0x0F; // width nibble 0 -> 8 bits
        assert!(matches!(
            Header::read_from(&mut &bad[..]),
            Err(LzwError::UnsupportedMaxBits(8))
        ));
    }

    #[test]
    fn test_header_truncated_magic_is_bad_magic() {
        assert!(matches!(
            Header::read_from(&mut &b"LZ"[..]),
            Err(LzwError::BadMagic)
        ));
    }

    #[test]
    fn test_stats_ratio() {
        let stats = CodecStats {
            input_bytes: 1000,
            output_bytes: 250,
        };
        assert!((stats.ratio() - 25.0).abs() < f64::EPSILON);
        assert_eq!(CodecStats::default().ratio(), 0.0);
    }
}
