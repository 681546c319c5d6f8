//! Error taxonomy shared by every stage of encoding and decoding.
//!
//! Nothing in the library recovers from these silently. They propagate to the
//! `encode`, `decode` and `verify` entry points, which discard any partial output.

use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HuffError>;

#[derive(Debug, Error)]
pub enum HuffError {
    /// Missing file, permission denied, or an output directory we cannot write into.
    #[error("cannot open {}: {source}", path.display())]
    OpenFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// Fewer header bytes than the fixed fields or the declared node count require.
    #[error("truncated header: expected {expected} bytes, found {found}")]
    TruncatedHeader { expected: u64, found: u64 },
    #[error("corrupt header: {0}")]
    CorruptHeader(&'static str),
    /// The payload ran out before every recorded symbol was decoded.
    #[error("truncated payload: decoded {decoded} of {expected} symbols")]
    TruncatedPayload { decoded: u64, expected: u64 },
    #[error("corrupt payload: {0}")]
    CorruptPayload(&'static str),
    #[error("code length {0} exceeds the 128 bit limit")]
    CodeTooLong(usize),
    /// Refused to replace an existing file without --force.
    #[error("{} already exists", .0.display())]
    OutputExists(PathBuf),
    /// The input differed between the counting pass and the writing pass.
    #[error("input changed while it was being encoded")]
    InputChanged,
}

impl HuffError {
    /// Attach a path to an `io::Error` raised while opening a file.
    pub(crate) fn open(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> HuffError {
        let path = path.into();
        move |source| HuffError::OpenFailure { path, source }
    }
}
