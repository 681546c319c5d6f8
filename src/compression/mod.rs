//! The compression module holds the two end-to-end operations of huffpack.
//!
//! Encoding happens in the following steps:
//! - Scan: count how often each byte value occurs in the input.
//! - Build: merge leaves two at a time, lightest first, into one Huffman tree.
//! - Derive: walk each leaf up to the root once to get its code.
//! - Header: write the symbol count and the tree in pre-order.
//! - Payload: read the input again and write every byte's code, most significant bit first.
//!
//! Decoding follows the inverse of the compression process.
//! - Header: rebuild the tree and find where the payload starts.
//! - Stream: feed payload bits into a root-to-leaf walk, emitting a symbol at every leaf, until
//!   the recorded number of symbols has been produced.
//!
//! Both directions write into a temporary file next to the destination and only rename it into
//! place once everything succeeded.
//!

pub mod compress;
pub mod decompress;

use std::{fs::File, path::Path};

use log::trace;
use tempfile::NamedTempFile;

use crate::error::{HuffError, Result};

/// Run `write` against a temporary file in the directory of `output`, then move the file to
/// `output`. If `write` fails the temporary file is removed and `output` is left untouched.
pub(crate) fn persist_output<T, F>(output: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut File) -> Result<T>,
{
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(HuffError::open(output))?;
    trace!("Writing {} via {}", output.display(), temp.path().display());

    let value = write(temp.as_file_mut())?;
    temp.as_file().sync_all()?;
    temp.persist(output).map_err(|e| HuffError::Io(e.error))?;
    Ok(value)
}
