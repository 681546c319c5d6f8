//! BitReader: reads a packed bitstream one bit (or a few bits) at a time.
//!
//! NOTE: This module can read from any I/O source that supports the read() call. Bits come out
//! most significant first, the same order BitWriter puts them in.
//!

use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom},
    path::Path,
};

const BUFFER_SIZE: usize = 64 * 1024;
const BIT_MASK: u8 = 0xff;
/// Widest value `read_bits` returns.
pub const MAX_READ_BITS: u32 = u128::BITS;

/// Reads a bitstream.
#[derive(Debug)]
pub struct BitReader<R> {
    buffer: Vec<u8>,
    /// Byte in `buffer` holding the next bit.
    cursor: usize,
    /// Bits of the current byte already consumed (0-7).
    bit_index: usize,
    /// Bytes pulled from the source before the current buffer was filled.
    consumed: u64,
    source: R,
}

impl BitReader<File> {
    /// Open the file at `path` for bit reading.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }

    /// Open the file at `path` and start reading `byte_offset` bytes in, past a header.
    pub fn open_at(path: impl AsRef<Path>, byte_offset: u64) -> std::io::Result<Self> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(byte_offset))?;
        let mut reader = Self::new(file);
        reader.consumed = byte_offset;
        Ok(reader)
    }
}

impl<R: Read> BitReader<R> {
    /// Creates a new BitReader over `source`.
    pub fn new(source: R) -> Self {
        Self {
            buffer: Vec::with_capacity(BUFFER_SIZE),
            cursor: 0,
            bit_index: 0,
            consumed: 0,
            source,
        }
    }

    /// Check (and refill) buffer. Returns true if we have data, false if there is no more
    fn have_data(&mut self) -> std::io::Result<bool> {
        // Only try to read more data when the whole buffer has been used
        if self.cursor == self.buffer.len() {
            self.consumed += self.buffer.len() as u64;
            self.buffer.resize(BUFFER_SIZE, 0);
            let size = loop {
                match self.source.read(&mut self.buffer) {
                    Ok(size) => break size,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            };
            // Adjust the buffer if we read less than the buffer size
            self.buffer.truncate(size);
            self.cursor = 0;
            self.bit_index = 0;
            // If nothing came back from our read attempt, then we have no more data.
            if size == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Return the next bit (*true* for 1), or None at the end of the stream.
    pub fn read_bit(&mut self) -> std::io::Result<Option<bool>> {
        if self.bit_index == 0 && !self.have_data()? {
            return Ok(None);
        }
        let bit = (self.buffer[self.cursor] & BIT_MASK >> self.bit_index) >> (7 - self.bit_index);
        self.bit_index += 1;
        self.bit_index %= 8;
        if self.bit_index == 0 {
            self.cursor += 1;
        }
        Ok(Some(bit == 1))
    }

    /// Return the next `n` bits as one value, first bit most significant, or None if the
    /// stream ends before all `n` bits are available.
    pub fn read_bits(&mut self, mut n: u32) -> std::io::Result<Option<u128>> {
        if n > MAX_READ_BITS {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("cannot read {} bits at once", n),
            ));
        }
        let mut result = 0_u128;

        // Finish a partial byte first
        while n > 0 && self.bit_index > 0 {
            match self.read_bit()? {
                Some(bit) => result = result << 1 | bit as u128,
                None => return Ok(None),
            }
            n -= 1;
        }
        // Then whole bytes
        while n >= 8 {
            if !self.have_data()? {
                return Ok(None);
            }
            result = result << 8 | self.buffer[self.cursor] as u128;
            self.cursor += 1;
            n -= 8;
        }
        // And the leading bits of one more byte
        while n > 0 {
            match self.read_bit()? {
                Some(bit) => result = result << 1 | bit as u128,
                None => return Ok(None),
            }
            n -= 1;
        }
        Ok(Some(result))
    }

    /// Returns a byte, or None if there is no more data to read. Calls read_bits(8).
    pub fn byte(&mut self) -> std::io::Result<Option<u8>> {
        Ok(self.read_bits(8)?.map(|byte| byte as u8))
    }

    /// Position of the next bit as bytes from the start of the source, and bits into that byte.
    pub fn position(&self) -> (u64, u8) {
        (self.consumed + self.cursor as u64, self.bit_index as u8)
    }

    /// Debugging function. Report current position in the stream.
    pub fn loc(&self) -> String {
        let (bytes, bits) = self.position();
        format!("[{}.{}]", bytes, bits)
    }

    /// Release the reader, handing back the underlying source.
    pub fn close(self) -> R {
        self.source
    }
}
