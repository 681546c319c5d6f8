use log::{debug, error, info, trace};

use crate::bitstream::bitreader::BitReader;
use crate::error::{HuffError, Result};
use crate::huffman_coding::{
    tree::{HuffmanTree, NodeKind},
    tree_codec::{read_header, Header},
};

use super::persist_output;

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
};

/// Decompress the file at `encoded` into `output`.
pub fn decode(encoded: &Path, output: &Path) -> Result<()> {
    let (header, mut br) = open_encoded(encoded)?;
    let decoded = persist_output(output, |f_out| decode_payload(&header, &mut br, f_out))
        .map_err(|e| {
            error!("Decoding {} failed: {}", encoded.display(), e);
            e
        })?;
    info!(
        "Decoded {} into {} ({} bytes).",
        encoded.display(),
        output.display(),
        decoded
    );
    Ok(())
}

/// Decode the file at `encoded` without keeping the output. Returns the decoded length.
pub fn verify(encoded: &Path) -> Result<u64> {
    let (header, mut br) = open_encoded(encoded)?;
    let decoded = decode_payload(&header, &mut br, io::sink())?;
    info!("{}: ok, {} bytes.", encoded.display(), decoded);
    Ok(decoded)
}

/// Decode a complete compressed stream (header and payload) from `source` into `sink`.
pub fn decode_stream<R: Read, W: Write>(mut source: R, sink: W) -> Result<u64> {
    let header = read_header(&mut source)?;
    let mut br = BitReader::new(source);
    decode_payload(&header, &mut br, sink)
}

/// READ-HEADER: rebuild the tree, then reopen the file positioned on the payload.
fn open_encoded(path: &Path) -> Result<(Header, BitReader<File>)> {
    let header = {
        let mut fin = File::open(path).map_err(HuffError::open(path))?;
        read_header(&mut fin)?
    };
    debug!(
        "Read header of {}: {} symbols, payload at byte {}",
        path.display(),
        header.symbol_count,
        header.len
    );
    let br = BitReader::open_at(path, header.len).map_err(HuffError::open(path))?;
    Ok((header, br))
}

/// STREAM: walk the tree once per recorded symbol, then insist that only padding is left.
fn decode_payload<R: Read, W: Write>(
    header: &Header,
    br: &mut BitReader<R>,
    sink: W,
) -> Result<u64> {
    let mut out = BufWriter::new(sink);
    let mut decoded = 0_u64;

    if let Some(tree) = &header.tree {
        while decoded < header.symbol_count {
            match next_symbol(tree, br)? {
                Some(symbol) => out.write_all(&[symbol])?,
                None => {
                    debug!("Payload ended at {}", br.loc());
                    return Err(HuffError::TruncatedPayload {
                        decoded,
                        expected: header.symbol_count,
                    });
                }
            }
            decoded += 1;
        }
    }
    trace!("Last symbol ends at {}", br.loc());
    check_padding(br)?;

    out.flush()?;
    Ok(decoded)
}

/// Walk from the root to a leaf. None if the stream ends first, wherever that happens.
fn next_symbol<R: Read>(tree: &HuffmanTree, br: &mut BitReader<R>) -> Result<Option<u8>> {
    let mut id = tree.root();

    // A lone leaf still spends one 0 bit per symbol
    if let NodeKind::Leaf { symbol } = tree.node(id).kind {
        return match br.read_bit()? {
            None => Ok(None),
            Some(false) => Ok(Some(symbol)),
            Some(true) => Err(HuffError::CorruptPayload("set bit in a single-symbol payload")),
        };
    }

    loop {
        match tree.node(id).kind {
            NodeKind::Leaf { symbol } => return Ok(Some(symbol)),
            NodeKind::Branch { left, right } => match br.read_bit()? {
                Some(bit) => id = if bit { right } else { left },
                None => return Ok(None),
            },
        }
    }
}

/// After the last symbol only zero bits up to the next byte boundary may follow.
fn check_padding<R: Read>(br: &mut BitReader<R>) -> Result<()> {
    for _ in 0..8 {
        match br.read_bit()? {
            None => return Ok(()),
            Some(true) => return Err(HuffError::CorruptPayload("non-zero padding")),
            Some(false) => {}
        }
    }
    Err(HuffError::CorruptPayload("trailing data after payload"))
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::Path;

    use super::{decode, decode_stream, verify};
    use crate::compression::compress::{encode, encode_stream, scan};
    use crate::error::HuffError;

    fn encoded(data: &[u8]) -> Vec<u8> {
        let freqs = scan(&mut &data[..]).unwrap();
        let mut out = Vec::new();
        encode_stream(&freqs, &mut &data[..], &mut out).unwrap();
        out
    }

    fn round_trip(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let n = decode_stream(encoded(data).as_slice(), &mut out).unwrap();
        assert_eq!(n, data.len() as u64);
        out
    }

    fn file_round_trip(dir: &Path, data: &[u8]) -> Vec<u8> {
        let input = dir.join("input");
        let packed = dir.join("input.huf");
        let output = dir.join("input.out");
        fs::write(&input, data).unwrap();
        encode(&input, &packed).unwrap();
        decode(&packed, &output).unwrap();
        fs::read(&output).unwrap()
    }

    #[test]
    fn round_trip_test() {
        let samples: Vec<Vec<u8>> = vec![
            vec![],
            vec![0],
            vec![0xff; 1000],
            b"aab".to_vec(),
            b"abracadabra".to_vec(),
            (0..=255).collect(),
            (0..=255).rev().cycle().take(5000).collect(),
            b"\0\0\0\x01\0\0\x02 zero bytes are ordinary symbols".to_vec(),
        ];
        for data in samples {
            assert_eq!(round_trip(&data), data);
        }
    }

    #[test]
    fn skewed_round_trip_test() {
        // Fibonacci counts give a deep tree with codes longer than two bytes
        let mut data = vec![];
        let (mut a, mut b) = (1_usize, 1_usize);
        for symbol in 0..20_u8 {
            data.extend(std::iter::repeat(symbol).take(a));
            (a, b) = (b, a + b);
        }
        assert_eq!(round_trip(&data), data);
    }

    #[test]
    fn file_round_trip_test() {
        let dir = tempfile::tempdir().unwrap();
        let text = "Call me Ishmael. Some years ago, never mind how long precisely, ".repeat(300);
        assert_eq!(file_round_trip(dir.path(), text.as_bytes()), text.as_bytes());
        assert_eq!(file_round_trip(dir.path(), b""), b"");
        assert_eq!(file_round_trip(dir.path(), &[7; 100_000]), vec![7; 100_000]);
        let all: Vec<u8> = (0..200_000_u32).map(|i| (i * 7919 % 251) as u8).collect();
        assert_eq!(file_round_trip(dir.path(), &all), all);
    }

    #[test]
    fn empty_file_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty");
        let packed = dir.path().join("empty.huf");
        fs::write(&input, b"").unwrap();
        encode(&input, &packed).unwrap();
        assert_eq!(verify(&packed).unwrap(), 0);
    }

    #[test]
    fn single_symbol_payload_test() {
        let bytes = encoded(&[b'q'; 9]);
        // Nine one-bit codes take two payload bytes
        assert_eq!(bytes.len(), 12 + 2);
        assert_eq!(round_trip(&[b'q'; 9]), vec![b'q'; 9]);

        let mut bad = bytes.clone();
        bad[12] = 0x40;
        assert!(matches!(
            decode_stream(bad.as_slice(), Vec::new()),
            Err(HuffError::CorruptPayload(_))
        ));
    }

    #[test]
    fn truncated_payload_test() {
        let data = b"She sells sea shells by the sea shore".repeat(4);
        let bytes = encoded(&data);
        let cut = &bytes[..bytes.len() - 2];
        match decode_stream(cut, Vec::new()) {
            Err(HuffError::TruncatedPayload { decoded, expected }) => {
                assert!(decoded < expected);
                assert_eq!(expected, data.len() as u64);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn truncated_header_test() {
        let bytes = encoded(b"abcdefg");
        assert!(matches!(
            decode_stream(&bytes[..12], Vec::new()),
            Err(HuffError::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn trailing_data_test() {
        let mut bytes = encoded(b"abcdefg");
        bytes.push(0);
        assert!(matches!(
            decode_stream(bytes.as_slice(), Vec::new()),
            Err(HuffError::CorruptPayload(_))
        ));
    }

    #[test]
    fn non_zero_padding_test() {
        // "aab" is 110 followed by five padding bits
        let mut bytes = encoded(b"aab");
        *bytes.last_mut().unwrap() |= 0x01;
        assert!(matches!(
            decode_stream(bytes.as_slice(), Vec::new()),
            Err(HuffError::CorruptPayload(_))
        ));
    }

    #[test]
    fn failed_decode_leaves_no_output_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let packed = dir.path().join("in.huf");
        let output = dir.path().join("out");
        fs::write(&input, "some text worth keeping ".repeat(50)).unwrap();
        encode(&input, &packed).unwrap();

        let bytes = fs::read(&packed).unwrap();
        fs::write(&packed, &bytes[..bytes.len() - 3]).unwrap();
        assert!(matches!(
            decode(&packed, &output),
            Err(HuffError::TruncatedPayload { .. })
        ));
        assert!(!output.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn missing_encoded_file_test() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            verify(&dir.path().join("missing.huf")),
            Err(HuffError::OpenFailure { .. })
        ));
    }

    #[test]
    fn encoding_twice_is_identical_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::write(&input, "determinism ".repeat(40)).unwrap();
        encode(&input, &dir.path().join("a.huf")).unwrap();
        encode(&input, &dir.path().join("b.huf")).unwrap();
        assert_eq!(
            fs::read(dir.path().join("a.huf")).unwrap(),
            fs::read(dir.path().join("b.huf")).unwrap()
        );
    }
}
