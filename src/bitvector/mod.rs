//! Compressed succinct data structures: an RRR bitvector with O(1)-amortised
//! access/rank and O(log N) select, and a wavelet tree built on top of it
//! for small-alphabet sequences.

pub mod bits;
pub mod rrr;
pub mod wavelet;

pub use rrr::{RrrBitvector, DEFAULT_BLOCK_SIZE, DEFAULT_SUPERBLOCK_SIZE};
pub use wavelet::WaveletTree;
