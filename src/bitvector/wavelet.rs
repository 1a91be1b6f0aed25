//! A wavelet tree over a sequence of small-alphabet symbols, represented
//! as `⌈log2 σ⌉` concatenated [`RrrBitvector`]s (one per level, "level
//! order" layout) rather than a pointer tree, so the whole structure
//! shares the compressed bitvector's rank/select machinery.

use crate::error::{BitvectorError, BitvectorResult};

use super::rrr::RrrBitvector;

fn bits_to_represent(max_value: u64) -> u32 {
    if max_value == 0 {
        1
    } else {
        64 - max_value.leading_zeros()
    }
}

struct NodeSpan {
    zeros_before_lo: u64,
    zeros_in_node: u64,
    total_zeros: u64,
}

/// A succinct representation of a sequence over an alphabet of size
/// `sigma`, supporting `access`, `rank` and `select` in `O(log sigma)`
/// time (each step paying the underlying bitvector's O(1)-amortised
/// rank/access cost).
pub struct WaveletTree {
    n: u64,
    sigma: u32,
    levels: u32,
    bitvectors: Vec<RrrBitvector>,
}

impl WaveletTree {
    pub fn build(symbols: &[u32], sigma: u32) -> BitvectorResult<Self> {
        if sigma == 0 {
            return Err(BitvectorError::InvalidParameters("alphabet size must be at least 1".to_string()));
        }
        for &s in symbols {
            if s >= sigma {
                return Err(BitvectorError::InvalidParameters(format!(
                    "symbol {} is out of range for alphabet size {}",
                    s, sigma
                )));
            }
        }

        let n = symbols.len() as u64;
        let levels = if sigma <= 1 { 0 } else { bits_to_represent(sigma as u64 - 1) };

        let mut bitvectors = Vec::with_capacity(levels as usize);
        let mut current = symbols.to_vec();
        for l in 0..levels {
            let shift = levels - 1 - l;
            let bits: Vec<bool> = current.iter().map(|&s| ((s >> shift) & 1) == 1).collect();
            bitvectors.push(RrrBitvector::from_bits(&bits)?);

            if l + 1 < levels {
                let mut zeros = Vec::with_capacity(current.len());
                let mut ones = Vec::with_capacity(current.len());
                for &s in &current {
                    if ((s >> shift) & 1) == 0 {
                        zeros.push(s);
                    } else {
                        ones.push(s);
                    }
                }
                zeros.extend(ones);
                current = zeros;
            }
        }

        Ok(Self { n, sigma, levels, bitvectors })
    }

    pub fn len(&self) -> u64 {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn alphabet_size(&self) -> u32 {
        self.sigma
    }

    fn node_span(&self, level: u32, lo: u64, hi: u64) -> BitvectorResult<NodeSpan> {
        let bv = &self.bitvectors[level as usize];
        let zeros_before_lo = if lo == 0 { 0 } else { bv.rank0(lo - 1)? };
        let zeros_at_hi = if hi == 0 { 0 } else { bv.rank0(hi - 1)? };
        let total_zeros = if self.n == 0 { 0 } else { bv.rank0(self.n - 1)? };
        Ok(NodeSpan {
            zeros_before_lo,
            zeros_in_node: zeros_at_hi - zeros_before_lo,
            total_zeros,
        })
    }

    fn child_range(&self, bit: u8, lo: u64, hi: u64, span: &NodeSpan) -> (u64, u64) {
        if bit == 0 {
            (span.zeros_before_lo, span.zeros_before_lo + span.zeros_in_node)
        } else {
            let ones_before_lo = lo - span.zeros_before_lo;
            let ones_in_node = (hi - lo) - span.zeros_in_node;
            let new_lo = span.total_zeros + ones_before_lo;
            (new_lo, new_lo + ones_in_node)
        }
    }

    fn child_pos(&self, level: u32, bit: u8, pos: u64, lo: u64, new_lo: u64, span: &NodeSpan) -> BitvectorResult<u64> {
        let bv = &self.bitvectors[level as usize];
        let rank0_upto_pos = bv.rank0(pos)?;
        if bit == 0 {
            Ok(new_lo + (rank0_upto_pos - span.zeros_before_lo) - 1)
        } else {
            let ones_upto_pos_in_node = (pos - lo + 1) - (rank0_upto_pos - span.zeros_before_lo);
            Ok(new_lo + ones_upto_pos_in_node - 1)
        }
    }

    fn check_bounds(&self, i: u64) -> BitvectorResult<()> {
        if i >= self.n {
            return Err(BitvectorError::OutOfBounds { position: i, len: self.n });
        }
        Ok(())
    }

    pub fn access(&self, i: u64) -> BitvectorResult<u32> {
        self.check_bounds(i)?;
        let (mut lo, mut hi, mut pos) = (0u64, self.n, i);
        let mut value: u32 = 0;
        for level in 0..self.levels {
            let bit = if self.bitvectors[level as usize].access(pos)? { 1u8 } else { 0u8 };
            value = (value << 1) | bit as u32;
            let span = self.node_span(level, lo, hi)?;
            let (new_lo, new_hi) = self.child_range(bit, lo, hi, &span);
            pos = self.child_pos(level, bit, pos, lo, new_lo, &span)?;
            lo = new_lo;
            hi = new_hi;
        }
        Ok(value)
    }

    /// Count of `symbol` occurrences in `[0, i]`.
    pub fn rank(&self, symbol: u32, i: u64) -> BitvectorResult<u64> {
        self.check_bounds(i)?;
        if symbol >= self.sigma {
            return Ok(0);
        }
        let (mut lo, mut hi, mut pos) = (0u64, self.n, i);
        for level in 0..self.levels {
            let shift = self.levels - 1 - level;
            let bit = ((symbol >> shift) & 1) as u8;
            let span = self.node_span(level, lo, hi)?;
            let (new_lo, new_hi) = self.child_range(bit, lo, hi, &span);
            pos = self.child_pos(level, bit, pos, lo, new_lo, &span)?;
            lo = new_lo;
            hi = new_hi;
        }
        Ok(pos - lo + 1)
    }

    /// Position of the `k`-th (1-indexed) occurrence of `symbol`.
    pub fn select(&self, symbol: u32, k: u64) -> BitvectorResult<u64> {
        if symbol >= self.sigma {
            return Err(BitvectorError::InvalidParameters(format!(
                "symbol {} is out of range for alphabet size {}",
                symbol, self.sigma
            )));
        }
        if k == 0 {
            return Err(BitvectorError::InvalidParameters("select is 1-indexed".to_string()));
        }

        let mut ranges = Vec::with_capacity(self.levels as usize);
        let mut bits = Vec::with_capacity(self.levels as usize);
        let (mut lo, mut hi) = (0u64, self.n);
        for level in 0..self.levels {
            ranges.push((lo, hi));
            let shift = self.levels - 1 - level;
            let bit = ((symbol >> shift) & 1) as u8;
            bits.push(bit);
            let span = self.node_span(level, lo, hi)?;
            let (new_lo, new_hi) = self.child_range(bit, lo, hi, &span);
            lo = new_lo;
            hi = new_hi;
        }

        if k > hi - lo {
            return Err(BitvectorError::OutOfBounds { position: k, len: hi - lo });
        }
        let mut pos = lo + (k - 1);

        for level in (0..self.levels).rev() {
            let (node_lo, node_hi) = ranges[level as usize];
            let bit = bits[level as usize];
            let span = self.node_span(level, node_lo, node_hi)?;
            let bv = &self.bitvectors[level as usize];
            pos = if bit == 0 {
                bv.select0(pos + 1)?
            } else {
                bv.select1(pos - span.total_zeros + 1)?
            };
        }
        Ok(pos)
    }
}
