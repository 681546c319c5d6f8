//! The tools module provides the helpers around the huffpack core.
//!
//! The tools are:
//! - cli: Command line interface for huffpack, including default output names.
//! - freq_count: Byte frequency count of the input, the first pass of encoding.
//!
pub mod cli;
pub mod freq_count;
