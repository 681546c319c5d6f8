//! Reads and writes the header that precedes every compressed payload.
//!
//! Layout, all integers big-endian:
//! - symbol count, u64: bytes in the original input
//! - node count, u16: nodes in the tree, 0 for an empty input
//! - the tree in pre-order, bit packed. Each node is a one-bit tag, 0 for a branch and 1 for a
//!   leaf, and a leaf tag is followed by its 8-bit symbol. Zero padded to a whole byte.
//!
//! A full binary tree with n nodes has (n + 1) / 2 leaves, so the node count alone fixes the
//! header length. The payload starts on the byte after it.

use std::io::{ErrorKind, Read, Write};

use log::{debug, trace};

use super::tree::{HuffmanTree, PreorderItem, MAX_NODES};
use crate::bitstream::{bitreader::BitReader, bitwriter::BitWriter};
use crate::error::{HuffError, Result};

/// Symbol count plus node count.
pub const FIXED_HEADER_LEN: u64 = 8 + 2;

const BRANCH_TAG: bool = false;
const LEAF_TAG: bool = true;

/// A decoded header.
#[derive(Debug)]
pub struct Header {
    /// Bytes in the original input.
    pub symbol_count: u64,
    /// None for an empty input.
    pub tree: Option<HuffmanTree>,
    /// Total header bytes, i.e. where the payload starts.
    pub len: u64,
}

/// Bytes taken by a packed tree of `node_count` nodes.
pub fn tree_bytes(node_count: u16) -> u64 {
    let nodes = node_count as u64;
    let leaves = (nodes + 1) / 2;
    (nodes + 8 * leaves + 7) / 8
}

/// Write the header and leave the writer on a byte boundary. Returns the header length.
pub fn write_header<W: Write>(
    bw: &mut BitWriter<W>,
    symbol_count: u64,
    tree: Option<&HuffmanTree>,
) -> Result<u64> {
    let start = bw.bytes_written();
    let node_count = tree.map_or(0, |tree| tree.len()) as u16;

    bw.write_bits(symbol_count as u128, 64)?;
    bw.write_bits(node_count as u128, 16)?;
    if let Some(tree) = tree {
        for item in tree.preorder() {
            match item {
                PreorderItem::Branch => bw.write_bit(BRANCH_TAG)?,
                PreorderItem::Leaf(symbol) => {
                    bw.write_bit(LEAF_TAG)?;
                    bw.write_bits(symbol as u128, 8)?;
                }
            }
        }
    }
    bw.flush()?;

    let len = bw.bytes_written() - start;
    debug!(
        "Wrote header: {} symbols, {} nodes, {} bytes",
        symbol_count, node_count, len
    );
    Ok(len)
}

/// Read and validate a header from the start of `source`.
pub fn read_header<R: Read>(source: &mut R) -> Result<Header> {
    let mut fixed = [0_u8; FIXED_HEADER_LEN as usize];
    let found = read_full(source, &mut fixed)?;
    if found < fixed.len() {
        return Err(HuffError::TruncatedHeader {
            expected: FIXED_HEADER_LEN,
            found: found as u64,
        });
    }
    let mut count = [0_u8; 8];
    count.copy_from_slice(&fixed[..8]);
    let symbol_count = u64::from_be_bytes(count);
    let node_count = u16::from_be_bytes([fixed[8], fixed[9]]);
    trace!(
        "Header declares {} symbols and {} nodes",
        symbol_count,
        node_count
    );

    if node_count as usize > MAX_NODES {
        return Err(HuffError::CorruptHeader("too many tree nodes"));
    }
    if node_count != 0 && node_count % 2 == 0 {
        return Err(HuffError::CorruptHeader("even node count"));
    }
    if (node_count == 0) != (symbol_count == 0) {
        return Err(HuffError::CorruptHeader("node count does not match symbol count"));
    }

    let len = FIXED_HEADER_LEN + tree_bytes(node_count);
    if node_count == 0 {
        return Ok(Header {
            symbol_count,
            tree: None,
            len,
        });
    }

    let mut packed = vec![0_u8; tree_bytes(node_count) as usize];
    let found = read_full(source, &mut packed)?;
    if found < packed.len() {
        return Err(HuffError::TruncatedHeader {
            expected: len,
            found: FIXED_HEADER_LEN + found as u64,
        });
    }

    let tree = unpack_tree(&packed, node_count)?;
    Ok(Header {
        symbol_count,
        tree: Some(tree),
        len,
    })
}

/// Parse exactly `node_count` pre-order nodes out of the packed tree bytes.
fn unpack_tree(packed: &[u8], node_count: u16) -> Result<HuffmanTree> {
    const SHORT: HuffError = HuffError::CorruptHeader("tree shape does not match node count");
    let mut br = BitReader::new(packed);
    let mut items = Vec::with_capacity(node_count as usize);

    for _ in 0..node_count {
        let item = if br.read_bit()?.ok_or(SHORT)? == LEAF_TAG {
            PreorderItem::Leaf(br.byte()?.ok_or(SHORT)?)
        } else {
            PreorderItem::Branch
        };
        items.push(item);
    }
    while let Some(bit) = br.read_bit()? {
        if bit {
            return Err(HuffError::CorruptHeader("non-zero padding after tree"));
        }
    }

    HuffmanTree::from_preorder(&items)
}

/// Fill `buf` as far as the source allows. Returns the bytes read.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
