//! UnpackReader - one-shot decompression over a byte source
//!
//! Parses the container header on construction, then [`UnpackReader::unpack`]
//! consumes the instance and streams decoded bytes into a writer, verifying
//! the declared size at the end.

use super::segment::SegmentBuffer;
use crate::common::{
    Header, LzwError, Result, WidthState, CHUNK_SIZE, FIRST_FREE_CODE, NO_CODE,
};
use log::{debug, info};
use std::io::{Read, Write};

/// Streaming LZW decompressor for the framed container format.
#[derive(Debug)]
pub struct UnpackReader<R: Read> {
    reader: R,
    header: Header,
    clear_code: u16,
    segment: SegmentBuffer,
    width: WidthState,
    /// `prefix[c]` is the code of the prior string of entry `c`, or
    /// [`NO_CODE`] while the slot is unallocated. Codes below 256 are
    /// implicit literals and never looked up here.
    prefix: Vec<u16>,
    /// `suffix[c]` is the final byte of the string entry `c` denotes.
    suffix: Vec<u8>,
    /// Reconstruction stack; strings come off the prefix chain reversed.
    stack: Vec<u8>,
    /// Output staging buffer, flushed at exactly [`CHUNK_SIZE`] bytes.
    staging: Vec<u8>,
    staged: usize,
}

impl<R: Read> UnpackReader<R> {
    /// Read and validate the container header, allocating decode state
    /// sized to the width the header declares.
    pub fn new(mut reader: R) -> Result<Self> {
        if cfg!(target_endian = "big") {
            return Err(LzwError::BigEndianHost);
        }
        let header = Header::read_from(&mut reader)?;
        let max_code = header.max_bits.max_code();
        Ok(Self {
            clear_code: header.max_bits.clear_code(),
            prefix: vec![NO_CODE; max_code],
            suffix: vec![0; max_code],
            stack: Vec::with_capacity(CHUNK_SIZE),
            staging: vec![0; CHUNK_SIZE],
            staged: 0,
            segment: SegmentBuffer::new(),
            width: WidthState::new(),
            header,
            reader,
        })
    }

    /// The parsed container header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Decode the whole stream into `output`, returning the byte count.
    ///
    /// Fails with [`LzwError::SizeMismatch`] when the decoded length
    /// disagrees with the header, and with [`LzwError::UnexpectedEof`] when
    /// a segment runs out of bits before its terminating code.
    pub fn unpack<W: Write>(mut self, output: &mut W) -> Result<u64> {
        let expected = u64::from(self.header.input_size);
        info!("expected output size: {expected}");
        let mut total = 0u64;

        loop {
            self.segment.load(&mut self.reader)?;
            self.width.reset();
            let mut old_code = NO_CODE;

            loop {
                let code = self
                    .segment
                    .next_code(self.width.running_bits, self.width.eof_code)?;

                if code == self.width.eof_code {
                    output
                        .write_all(&self.staging[..self.staged])
                        .map_err(LzwError::Write)?;
                    total += self.staged as u64;
                    if total != expected {
                        return Err(LzwError::SizeMismatch {
                            expected,
                            actual: total,
                        });
                    }
                    return Ok(total);
                }

                if code == self.clear_code {
                    self.prefix.fill(NO_CODE);
                    break;
                }

                if code < 256 {
                    assert!(self.staged < CHUNK_SIZE);
                    self.staging[self.staged] = code as u8;
                    self.staged += 1;
                } else {
                    self.expand(code, old_code)?;
                }

                if old_code != NO_CODE {
                    let slot = usize::from(self.width.run_code);
                    if slot >= self.prefix.len() {
                        return Err(LzwError::InvalidCode(code));
                    }
                    self.prefix[slot] = old_code;
                    if code != self.width.run_code {
                        let first = self.first_byte(code)?;
                        self.suffix[slot] = first;
                    }
                    self.width.bump();
                    if self.width.maybe_widen() {
                        debug!("code width now {} bits", self.width.running_bits);
                    }
                }
                old_code = code;

                if self.staged == CHUNK_SIZE {
                    output.write_all(&self.staging).map_err(LzwError::Write)?;
                    total += CHUNK_SIZE as u64;
                    self.staged = 0;
                    // The encoder broke its run at this exact input offset,
                    // so no entry spans the boundary; dropping the previous
                    // code here is what keeps the two sides aligned (and
                    // bounds the stack to one staging buffer's worth).
                    old_code = NO_CODE;
                }
            }
        }
    }

    /// Reconstruct the string for a multi-byte code into the staging
    /// buffer. `prefix[code] == NO_CODE` means the code is the one being
    /// defined by this very step (the KwKwK case): its string is the
    /// previous string plus that string's first byte.
    fn expand(&mut self, code: u16, old_code: u16) -> Result<()> {
        let mut cur = if self.prefix[usize::from(code)] == NO_CODE {
            if old_code == NO_CODE || code != self.width.run_code {
                return Err(LzwError::InvalidCode(code));
            }
            let first = self.first_byte(old_code)?;
            self.suffix[usize::from(code)] = first;
            assert!(self.stack.len() < CHUNK_SIZE);
            self.stack.push(first);
            old_code
        } else {
            code
        };

        while cur >= FIRST_FREE_CODE {
            assert!(self.stack.len() < CHUNK_SIZE);
            let slot = usize::from(cur);
            self.stack.push(self.suffix[slot]);
            cur = self.prefix[slot];
            if cur == NO_CODE {
                return Err(LzwError::InvalidCode(code));
            }
        }
        assert!(self.stack.len() < CHUNK_SIZE);
        self.stack.push(cur as u8);

        while let Some(byte) = self.stack.pop() {
            assert!(self.staged < CHUNK_SIZE);
            self.staging[self.staged] = byte;
            self.staged += 1;
        }
        Ok(())
    }

    /// Follow the prefix chain down to the literal root byte. Installed
    /// prefixes always point at strictly smaller codes, so the walk
    /// terminates.
    fn first_byte(&self, code: u16) -> Result<u8> {
        let start = code;
        let mut cur = code;
        while cur >= FIRST_FREE_CODE {
            let slot = usize::from(cur);
            if slot >= self.prefix.len() || self.prefix[slot] == NO_CODE {
                return Err(LzwError::InvalidCode(start));
            }
            cur = self.prefix[slot];
        }
        Ok(cur as u8)
    }
}
