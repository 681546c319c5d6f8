//! The bitstream module forms the I/O subsystem of huffpack.
//!
//! Huffman codes have arbitrary lengths, so the compressed stream is a sequence of bits rather
//! than bytes. BitWriter packs codes most significant bit first into bytes and zero pads the last
//! byte. BitReader hands the same bits back one at a time to the decoder's tree walk.
//!
//! Both sides keep one partially filled byte plus a buffer of whole bytes in front of a plain
//! `Read`/`Write` handle, so they work equally on files and on in-memory slices.
//!
pub mod bitreader;
pub mod bitwriter;
