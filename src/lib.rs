//! Static Huffman compression of files over the byte alphabet.
//!
//! Version 0.1.0
//!
//! Each file is compressed with a code built from its own byte counts. The compressed file
//! carries the original length and the code tree in its header, followed by the bit-packed
//! codes of every input byte.
//!
//! Basic usage to compress a file is as follows:
//!
//! `$> huffpack -z test.txt`
//!
//! This will compress the file and create the file test.txt.huf. `huffpack -d test.txt.huf`
//! restores test.txt.
//!
pub mod bitstream;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::{
    compress::encode,
    decompress::{decode, decode_stream, verify},
};
pub use error::{HuffError, Result};
