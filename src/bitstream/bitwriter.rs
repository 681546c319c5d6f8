//! BitWriter: packs single bits and arbitrary-width values into bytes, most significant bit
//! first, and hands full bytes to any `std::io::Write` sink.
//!
//! NOTE: A partially filled byte only reaches the sink on `flush()`, `close(true)` or drop.
//!

use std::{fs::File, io::Write, path::Path};

/// Bytes collected before they are handed to the sink.
const BUFFER_SIZE: usize = 64 * 1024;
/// Bits in the pending byte.
const BYTE_BITS: u8 = 8;
/// Widest value `write_bits` accepts.
pub const MAX_WRITE_BITS: u32 = u128::BITS;

/// Writes a bitstream to a sink.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    /// Sink for finished bytes. Only `None` after `close()`.
    writer: Option<W>,
    /// Finished bytes waiting to be written to the sink.
    output: Vec<u8>,
    /// Byte being assembled. Bits below the fill position are always zero.
    pending: u8,
    /// Free bits left in `pending`, 8 when it is empty.
    free: u8,
    /// Count of finished bytes so far.
    written: u64,
}

impl BitWriter<File> {
    /// Create (or truncate) the file at `path` and write a bitstream into it.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> BitWriter<W> {
    /// Create a new BitWriter in front of `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            output: Vec::with_capacity(BUFFER_SIZE),
            pending: 0,
            free: BYTE_BITS,
            written: 0,
        }
    }

    /// Append one bit to the stream.
    pub fn write_bit(&mut self, bit: bool) -> std::io::Result<()> {
        self.free -= 1;
        self.pending |= (bit as u8) << self.free;
        if self.free == 0 {
            self.push_pending()?;
        }
        Ok(())
    }

    /// Append the low `n_bits` of `value`, bit `n_bits - 1` first.
    pub fn write_bits(&mut self, value: u128, n_bits: u32) -> std::io::Result<()> {
        if n_bits > MAX_WRITE_BITS {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("cannot write {} bits at once", n_bits),
            ));
        }
        let mut remaining = n_bits;

        // Top up a partially filled pending byte from the top of the value
        if self.free < BYTE_BITS && remaining > 0 {
            let take = remaining.min(self.free as u32);
            let top = (value >> (remaining - take)) & low_mask(take);
            self.free -= take as u8;
            self.pending |= (top as u8) << self.free;
            remaining -= take;
            if self.free == 0 {
                self.push_pending()?;
            }
        }

        // Whole bytes go straight out
        while remaining >= BYTE_BITS as u32 {
            let byte = (value >> (remaining - BYTE_BITS as u32)) as u8;
            self.push_byte(byte)?;
            remaining -= BYTE_BITS as u32;
        }

        // Whatever is left starts a fresh pending byte
        if remaining > 0 {
            self.free = BYTE_BITS - remaining as u8;
            self.pending = ((value & low_mask(remaining)) as u8) << self.free;
        }
        Ok(())
    }

    /// Force out a partially filled byte, padding its unused low bits with zeros, then push
    /// everything buffered through to the sink. The next write starts on a byte boundary.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.free < BYTE_BITS {
            self.push_pending()?;
        }
        self.drain()?;
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }
        Ok(())
    }

    /// Optionally flush, then release the sink. Without `flush` a partially filled byte is
    /// dropped, but whole bytes are still delivered.
    pub fn close(mut self, flush: bool) -> std::io::Result<W> {
        if flush {
            self.flush()?;
        } else {
            self.pending = 0;
            self.free = BYTE_BITS;
            self.drain()?;
        }
        self.writer.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "BitWriter already closed")
        })
    }

    /// Count of whole bytes produced so far (written or still buffered).
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Debugging function to return the number of bytes.bits output so far
    pub fn loc(&self) -> String {
        format!("[{}.{}]", self.written, BYTE_BITS - self.free)
    }

    fn push_pending(&mut self) -> std::io::Result<()> {
        let byte = self.pending;
        self.pending = 0;
        self.free = BYTE_BITS;
        self.push_byte(byte)
    }

    fn push_byte(&mut self, byte: u8) -> std::io::Result<()> {
        self.output.push(byte);
        self.written += 1;
        if self.output.len() >= BUFFER_SIZE {
            self.drain()?;
        }
        Ok(())
    }

    /// Hand the finished bytes to the sink.
    fn drain(&mut self) -> std::io::Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(&self.output)?;
            self.output.clear();
        }
        Ok(())
    }
}

impl<W: Write> Drop for BitWriter<W> {
    fn drop(&mut self) {
        // Best effort, as with BufWriter. Call close() to see errors.
        if self.writer.is_some() {
            let _ = self.flush();
        }
    }
}

/// Mask selecting the low `n` bits, `n <= 8`.
#[inline(always)]
fn low_mask(n: u32) -> u128 {
    (1_u128 << n) - 1
}

#[cfg(test)]
mod test {
    use super::BitWriter;

    fn written(f: impl FnOnce(&mut BitWriter<Vec<u8>>)) -> Vec<u8> {
        let mut bw = BitWriter::new(Vec::new());
        f(&mut bw);
        bw.close(true).unwrap()
    }

    #[test]
    fn write_bit_partial_byte_test() {
        let out = written(|bw| {
            for bit in [true, false, true] {
                bw.write_bit(bit).unwrap();
            }
        });
        assert_eq!(out, vec![0xA0]);
    }

    #[test]
    fn write_bit_full_byte_test() {
        let out = written(|bw| {
            for bit in [1, 0, 1, 1, 1, 1, 0, 1] {
                bw.write_bit(bit == 1).unwrap();
            }
        });
        assert_eq!(out, vec![0xBD]);
    }

    #[test]
    fn write_bits_two_bytes_test() {
        let out = written(|bw| bw.write_bits(0x555, 16).unwrap());
        assert_eq!(out, vec![0x05, 0x55]);
    }

    #[test]
    fn write_bits_spanning_three_bytes_test() {
        let out = written(|bw| bw.write_bits(0x2796, 18).unwrap());
        assert_eq!(out, vec![0x09, 0xE5, 0x80]);
    }

    #[test]
    fn write_bits_after_partial_byte_test() {
        let out = written(|bw| {
            bw.write_bit(true).unwrap();
            bw.write_bits(0b0110, 4).unwrap();
            bw.write_bits(0xABC, 12).unwrap();
        });
        // 1 0110 101010111100 -> 10110101 01011110 0
        assert_eq!(out, vec![0b1011_0101, 0b0101_1110, 0]);
    }

    #[test]
    fn write_bits_ignores_high_bits_test() {
        let out = written(|bw| bw.write_bits(0xFF_F3, 4).unwrap());
        assert_eq!(out, vec![0x30]);
    }

    #[test]
    fn write_bits_wide_values_test() {
        let out = written(|bw| {
            bw.write_bits(u64::MAX as u128, 64).unwrap();
            bw.write_bit(false).unwrap();
            bw.write_bits(u128::MAX, 128).unwrap();
        });
        assert_eq!(out.len(), 25);
        assert!(out[..8].iter().all(|&b| b == 0xff));
        assert_eq!(out[8], 0x7f);
        assert!(out[9..24].iter().all(|&b| b == 0xff));
        assert_eq!(out[24], 0x80);
    }

    #[test]
    fn write_bits_rejects_oversize_test() {
        let mut bw = BitWriter::new(Vec::new());
        assert!(bw.write_bits(1, 129).is_err());
    }

    #[test]
    fn flush_realigns_test() {
        let out = written(|bw| {
            bw.write_bits(0b11, 2).unwrap();
            bw.flush().unwrap();
            bw.write_bits(0b1, 1).unwrap();
        });
        assert_eq!(out, vec![0xC0, 0x80]);
    }

    #[test]
    fn close_without_flush_drops_partial_byte_test() {
        let mut bw = BitWriter::new(Vec::new());
        bw.write_bits(0xABCD, 16).unwrap();
        bw.write_bits(0b101, 3).unwrap();
        assert_eq!(bw.close(false).unwrap(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn bytes_written_and_loc_test() {
        let mut bw = BitWriter::new(Vec::new());
        bw.write_bits(0x1234, 16).unwrap();
        bw.write_bits(0b1, 3).unwrap();
        assert_eq!(bw.bytes_written(), 2);
        assert_eq!(bw.loc(), "[2.3]");
    }

    #[test]
    fn create_file_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bits.bin");
        let mut bw = BitWriter::create(&path).unwrap();
        bw.write_bits(0x2796, 18).unwrap();
        bw.close(true).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![0x09, 0xE5, 0x80]);
    }

    #[test]
    fn drop_flushes_test() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.bin");
        {
            let mut bw = BitWriter::create(&path).unwrap();
            bw.write_bits(0b101, 3).unwrap();
        }
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xA0]);
    }
}
