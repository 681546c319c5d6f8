//! The huffman module builds the static code used by huffpack and carries it between the
//! encoder and the decoder.
//!
//! One code covers a whole file. The encoder counts every byte value, feeds one leaf per present
//! symbol into a min priority queue and repeatedly merges the two lightest nodes until a single
//! root remains. Codes come from walking each leaf's parent links up to the root.
//!
//! The tree itself is written in front of the payload (see tree_codec) so that the decoder can
//! rebuild it and walk it bit by bit.
//!

pub mod heap;
pub mod tree;
pub mod tree_codec;
