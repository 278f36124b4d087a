//! PackWriter - one-shot compression over a byte sink
//!
//! Owns the bit packer, the segment buffer and the dictionary, and drives
//! the encoder state machine over a reader. The instance is consumed by
//! [`PackWriter::pack`]; compressing twice requires a fresh writer.

use super::dict::CodeTable;
use crate::common::{
    read_error, Header, LzwError, MaxBits, Result, WidthState, CHUNK_SIZE,
};
use log::debug;
use std::io::{Read, Write};

/// Segment payloads at most this long use the two-byte big-endian length
/// prefix; anything longer is framed as `0xFF` plus a 32-bit little-endian
/// length.
pub(crate) const SHORT_SEGMENT_MAX: usize = 0x7FFF;

/// Streaming LZW compressor writing the framed container format.
#[derive(Debug)]
pub struct PackWriter<W: Write> {
    writer: W,
    max_bits: MaxBits,
    clear_code: u16,
    table: CodeTable,
    width: WidthState,
    /// Bit shift register; completed low bytes are moved into `segment`.
    code_buffer: u32,
    /// Number of pending bits in `code_buffer`. Below 8 between emissions.
    pending_bits: u32,
    /// Packed bytes of the segment being built.
    segment: Vec<u8>,
}

impl<W: Write> PackWriter<W> {
    /// Create a compressor for the given maximum code width.
    ///
    /// Fails on big-endian hosts (the container is little-endian) and on
    /// widths outside the encoder's 9..=15 range.
    pub fn new(writer: W, max_bits: MaxBits) -> Result<Self> {
        if cfg!(target_endian = "big") {
            return Err(LzwError::BigEndianHost);
        }
        let max_bits = MaxBits::for_pack(max_bits.bits())?;
        Ok(Self {
            writer,
            max_bits,
            clear_code: max_bits.clear_code(),
            table: CodeTable::new(max_bits),
            width: WidthState::new(),
            code_buffer: 0,
            pending_bits: 0,
            segment: Vec::with_capacity(4096),
        })
    }

    /// Compress everything `reader` yields and return the inner writer.
    ///
    /// `input_size` must be the exact number of bytes the reader will
    /// produce; it is recorded in the header and checked by the decoder.
    pub fn pack<R: Read>(mut self, reader: &mut R, input_size: u32) -> Result<W> {
        Header {
            max_bits: self.max_bits,
            input_size,
        }
        .write_to(&mut self.writer)?;

        let mut chunk = vec![0u8; CHUNK_SIZE];
        loop {
            let len = read_chunk(reader, &mut chunk)?;
            if len == 0 {
                break;
            }

            // The run in progress never crosses a chunk boundary: the
            // trailing code is emitted below and the next chunk starts a
            // fresh run. The decoder relies on this alignment when it drops
            // its previous code at every 16384-byte staging flush.
            let mut cur_code = u16::from(chunk[0]);
            for &byte in &chunk[1..len] {
                let key = (u32::from(cur_code) << 8) | u32::from(byte);
                if let Some(code) = self.table.get(key) {
                    cur_code = code;
                    continue;
                }

                self.emit(cur_code);
                cur_code = u16::from(byte);

                if self.width.run_code == self.clear_code {
                    debug!("dictionary full, writing reset");
                    self.emit_aligned(self.clear_code)?;
                    self.table.clear();
                    self.width.reset();
                } else {
                    self.table.insert(key, self.width.run_code);
                    self.width.bump();
                }
            }
            self.emit(cur_code);
        }

        let eof_code = self.width.eof_code;
        self.emit_aligned(eof_code)?;
        Ok(self.writer)
    }

    /// Append one code at the current width, flushing whole bytes into the
    /// segment buffer. The width check afterwards runs on every emission so
    /// it observes the pre-insert code count, which is what keeps encoder
    /// and decoder widths in lockstep.
    fn emit(&mut self, code: u16) {
        self.code_buffer |= u32::from(code) << self.pending_bits;
        self.pending_bits += u32::from(self.width.running_bits);
        while self.pending_bits >= 8 {
            self.segment.push((self.code_buffer & 0xFF) as u8);
            self.code_buffer >>= 8;
            self.pending_bits -= 8;
        }
        self.width.maybe_widen();
    }

    /// Append a reset or end-of-stream code, pad the shift register out to
    /// a byte boundary and write the finished segment.
    fn emit_aligned(&mut self, code: u16) -> Result<()> {
        self.code_buffer |= u32::from(code) << self.pending_bits;
        self.pending_bits += u32::from(self.width.running_bits);
        while self.pending_bits > 0 {
            self.segment.push((self.code_buffer & 0xFF) as u8);
            self.code_buffer >>= 8;
            self.pending_bits = self.pending_bits.saturating_sub(8);
        }
        self.code_buffer = 0;
        self.flush_segment()?;
        self.width.maybe_widen();
        Ok(())
    }

    /// Write the length prefix and payload of the current segment, then
    /// start a fresh one. The short form is big-endian, the long form
    /// little-endian behind a 0xFF marker; the asymmetry is part of the
    /// format.
    fn flush_segment(&mut self) -> Result<()> {
        let len = self.segment.len();
        debug!("writing {len} byte segment");
        if len <= SHORT_SEGMENT_MAX {
            self.writer
                .write_all(&[(len >> 8) as u8, (len & 0xFF) as u8])
                .map_err(LzwError::Write)?;
        } else {
            // Segments are bounded by the dictionary reset cycle, far below
            // 32 bits worth of bytes.
            debug_assert!(len <= u32::MAX as usize);
            self.writer.write_all(&[0xFF]).map_err(LzwError::Write)?;
            self.writer
                .write_all(&(len as u32).to_le_bytes())
                .map_err(LzwError::Write)?;
        }
        self.writer.write_all(&self.segment).map_err(LzwError::Write)?;
        self.segment.clear();
        Ok(())
    }
}

/// Fill `buf` from `reader`, short only at end of input. A plain `read`
/// may return less than a full chunk; the encoder's chunk boundaries must
/// land on exact multiples of [`CHUNK_SIZE`], so keep reading.
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(e)),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::HEADER_LEN;

    fn pack_all(data: &[u8], bits: u8) -> Vec<u8> {
        let mut out = Vec::new();
        let writer = PackWriter::new(&mut out, MaxBits::for_pack(bits).unwrap()).unwrap();
        let mut input = data;
        writer.pack(&mut input, data.len() as u32).unwrap();
        out
    }

    #[test]
    fn test_empty_input_writes_header_and_eof_segment() {
        let out = pack_all(b"", 15);
        // Header, two-byte length, then the 9-bit EOF code 511 padded to
        // two bytes: 0xFF 0x01.
        assert_eq!(out.len(), HEADER_LEN + 2 + 2);
        assert_eq!(&out[HEADER_LEN..], &[0x00, 0x02, 0xFF, 0x01]);
    }

    #[test]
    fn test_single_byte_stream_layout() {
        let out = pack_all(b"A", 15);
        // 'A' (9 bits) then EOF 511 (9 bits), padded: 18 bits -> 3 bytes.
        assert_eq!(&out[HEADER_LEN..HEADER_LEN + 2], &[0x00, 0x03]);
        let payload = &out[HEADER_LEN + 2..];
        assert_eq!(payload.len(), 3);
        // 0x41 | 511 << 9 = 0x3FE41 little-endian.
        assert_eq!(payload, &[0x41, 0xFE, 0x03]);
    }

    #[test]
    fn test_run_of_one_symbol_compresses() {
        let data = vec![b'A'; 4096];
        let out = pack_all(&data, 12);
        assert!(out.len() < data.len() / 8, "got {} bytes", out.len());
    }

    #[test]
    fn test_second_pack_is_a_fresh_instance() {
        // The writer is consumed by pack(); constructing twice is the only
        // way to compress twice, and both runs produce identical output.
        let a = pack_all(b"hello hello hello", 12);
        let b = pack_all(b"hello hello hello", 12);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_decoder_only_width() {
        let bits = MaxBits::for_unpack(16).unwrap();
        assert!(matches!(
            PackWriter::new(Vec::new(), bits),
            Err(LzwError::InvalidMaxBits(16))
        ));
    }
}
