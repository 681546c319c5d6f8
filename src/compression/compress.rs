use std::{
    fs::File,
    io::{ErrorKind, Read, Seek, SeekFrom, Write},
    path::Path,
};

use log::{debug, info, trace};

use super::persist_output;
use crate::bitstream::bitwriter::BitWriter;
use crate::error::{HuffError, Result};
use crate::huffman_coding::{
    tree::{CodeTable, HuffmanTree},
    tree_codec::write_header,
};
use crate::tools::freq_count::FrequencyTable;

/// Read size for both passes over the input.
const CHUNK_SIZE: usize = 64 * 1024;

/*
    Encoding runs two passes over the input file:
    - SCAN: count every byte value.
    - BUILD/DERIVE: build the tree from the counts and derive the code of every present symbol.
    - WRITE-HEADER: symbol count and the packed tree.
    - WRITE-PAYLOAD: rewind the input and write each byte's code.
    - CLOSE: flush the last partial byte and move the finished file into place.

    The output is assembled in a temporary file beside the destination, so a failure at any
    stage leaves nothing behind.
*/

/// Compress the file at `input` into `output`.
pub fn encode(input: &Path, output: &Path) -> Result<()> {
    let mut fin = File::open(input).map_err(HuffError::open(input))?;

    // SCAN
    let freqs = scan(&mut fin)?;
    let symbol_count = freqs.total();
    debug!(
        "Scanned {} bytes, {} distinct symbols",
        symbol_count,
        freqs.distinct()
    );

    let out_bytes = persist_output(output, |f_out| {
        fin.seek(SeekFrom::Start(0))?;
        encode_stream(&freqs, &mut fin, f_out)
    })?;

    info!(
        "Encoded {} ({} bytes) into {} ({} bytes).",
        input.display(),
        symbol_count,
        output.display(),
        out_bytes
    );
    Ok(())
}

/// Count the byte values of `source`.
pub fn scan<R: Read>(source: &mut R) -> Result<FrequencyTable> {
    let mut freqs = FrequencyTable::new();
    for_each_chunk(source, |chunk| {
        freqs.add(chunk);
        Ok(())
    })?;
    Ok(freqs)
}

/// Encode `source`, whose byte counts are `freqs`, into `sink`. Returns the bytes written.
pub fn encode_stream<R: Read, W: Write>(
    freqs: &FrequencyTable,
    source: &mut R,
    sink: W,
) -> Result<u64> {
    // BUILD
    let tree = HuffmanTree::from_frequencies(freqs);
    // DERIVE
    let codes = tree.as_ref().map(HuffmanTree::code_table).transpose()?;
    if let Some(tree) = &tree {
        debug!(
            "Built tree with {} nodes for {} symbols",
            tree.len(),
            tree.leaf_count()
        );
    }

    // WRITE-HEADER
    let mut bw = BitWriter::new(sink);
    let symbol_count = freqs.total();
    write_header(&mut bw, symbol_count, tree.as_ref())?;

    // WRITE-PAYLOAD
    let mut seen = 0_u64;
    if let Some(codes) = &codes {
        for_each_chunk(source, |chunk| {
            seen += chunk.len() as u64;
            write_codes(&mut bw, codes, chunk)
        })?;
    } else {
        for_each_chunk(source, |chunk| {
            seen += chunk.len() as u64;
            Ok(())
        })?;
    }
    if seen != symbol_count {
        return Err(HuffError::InputChanged);
    }
    trace!("Payload ends at {}", bw.loc());

    // CLOSE
    bw.flush()?;
    let written = bw.bytes_written();
    bw.close(false)?;
    Ok(written)
}

fn write_codes<W: Write>(bw: &mut BitWriter<W>, codes: &CodeTable, chunk: &[u8]) -> Result<()> {
    for &byte in chunk {
        let code = codes.get(byte).ok_or(HuffError::InputChanged)?;
        bw.write_bits(code.bits, code.len as u32)?;
    }
    Ok(())
}

/// Feed `source` to `f` in chunks until end of file.
fn for_each_chunk<R, F>(source: &mut R, mut f: F) -> Result<()>
where
    R: Read,
    F: FnMut(&[u8]) -> Result<()>,
{
    let mut buf = vec![0_u8; CHUNK_SIZE];
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        f(&buf[..n])?;
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::{encode, encode_stream, scan};
    use crate::error::HuffError;

    fn encoded(data: &[u8]) -> Vec<u8> {
        let freqs = scan(&mut &data[..]).unwrap();
        let mut out = Vec::new();
        let written = encode_stream(&freqs, &mut &data[..], &mut out).unwrap();
        assert_eq!(written, out.len() as u64);
        out
    }

    #[test]
    fn exact_file_test() {
        // b -> 0, a -> 1, so "aab" is 110 padded
        assert_eq!(
            encoded(b"aab"),
            vec![0, 0, 0, 0, 0, 0, 0, 3, 0, 3, 0x58, 0xAC, 0x20, 0xC0]
        );
    }

    #[test]
    fn single_symbol_file_test() {
        let out = encoded(&[b'a'; 20]);
        // 12 header bytes, then twenty 0 bits
        assert_eq!(out.len(), 12 + 3);
        assert_eq!(&out[12..], &[0, 0, 0]);
    }

    #[test]
    fn empty_file_test() {
        assert_eq!(encoded(b""), vec![0; 10]);
    }

    #[test]
    fn deterministic_test() {
        let data = b"It was the best of times, it was the worst of times.";
        assert_eq!(encoded(data), encoded(data));
    }

    #[test]
    fn compresses_skewed_input_test() {
        let mut data = vec![b'e'; 10_000];
        data.extend_from_slice(b"the rest of the alphabet is rare");
        assert!(encoded(&data).len() < data.len() / 4);
    }

    #[test]
    fn changed_input_test() {
        let freqs = scan(&mut &b"aab"[..]).unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            encode_stream(&freqs, &mut &b"aac"[..], &mut out),
            Err(HuffError::InputChanged)
        ));
        assert!(matches!(
            encode_stream(&freqs, &mut &b"aaba"[..], &mut out),
            Err(HuffError::InputChanged)
        ));
    }

    #[test]
    fn encode_file_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("in.txt.huf");
        fs::write(&input, b"aab").unwrap();
        encode(&input, &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), encoded(b"aab"));
    }

    #[test]
    fn missing_input_test() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.huf");
        match encode(&dir.path().join("missing"), &output) {
            Err(HuffError::OpenFailure { path, .. }) => assert!(path.ends_with("missing")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!output.exists());
    }
}
