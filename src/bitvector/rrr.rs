//! The RRR compressed bitvector: block-wise enumerative coding giving
//! O(1)-amortised `access`/`rank` and O(log N) `select`, named for Raman,
//! Raman and Rao's 2002 construction.
//!
//! Each block of `block_size` bits is stored as a `(class, offset)` pair:
//! `class` is the block's popcount, `offset` is the block's rank among
//! the `C(block_size, class)` possible blocks with that popcount, using
//! the combinatorial number system. A superblock groups `superblock_size`
//! blocks and caches cumulative rank and cumulative offset-bit-position
//! so a query only has to scan within one superblock.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{BitvectorError, BitvectorResult};

use super::bits::BitString;

/// Default block size, matching the reference implementation's constant.
pub const DEFAULT_BLOCK_SIZE: u32 = 15;
/// Default superblock size, in blocks.
pub const DEFAULT_SUPERBLOCK_SIZE: u32 = 32;

const HEADER_FIELDS: usize = 13;
const HEADER_BYTES: usize = HEADER_FIELDS * 8;

fn bits_to_represent(max_value: u64) -> u32 {
    if max_value == 0 {
        1
    } else {
        64 - max_value.leading_zeros()
    }
}

fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
    }
    result as u64
}

fn offset_width(class_count: u64) -> u32 {
    if class_count <= 1 {
        0
    } else {
        bits_to_represent(class_count - 1)
    }
}

/// Rank a `len`-bit block (given as the low `len` bits of `bits`) among
/// all blocks of the same length and popcount, using the combinatorial
/// number system in colex order.
fn rank_combination(bits: u64, class: u32) -> u64 {
    let mut offset = 0u64;
    let mut j = class as u64;
    for p in (0..64).rev() {
        if j == 0 {
            break;
        }
        if (bits >> p) & 1 == 1 {
            offset += binomial(p as u64, j);
            j -= 1;
        }
    }
    offset
}

/// Inverse of [`rank_combination`]: reconstruct the `len`-bit block with
/// the given `class` and combinadic `offset`.
fn unrank_combination(offset: u64, class: u32, len: u32) -> u64 {
    let mut bits = 0u64;
    let mut remaining = offset;
    let mut upper = len as u64;
    for j in (1..=class as u64).rev() {
        let mut v = upper.saturating_sub(1);
        while v >= j && binomial(v, j) > remaining {
            v -= 1;
        }
        remaining -= binomial(v, j);
        bits |= 1u64 << v;
        upper = v;
    }
    bits
}

fn read_bits_from_bytes(bytes: &[u8], bit_pos: u64, width: u32) -> u64 {
    if width == 0 {
        return 0;
    }
    let byte_start = (bit_pos / 8) as usize;
    let bit_off = (bit_pos % 8) as u32;
    let mut buf = [0u8; 16];
    if byte_start < bytes.len() {
        let avail = (bytes.len() - byte_start).min(16);
        buf[..avail].copy_from_slice(&bytes[byte_start..byte_start + avail]);
    }
    let raw = u128::from_le_bytes(buf);
    let shifted = raw >> bit_off;
    let mask: u128 = if width == 64 { u128::MAX } else { (1u128 << width) - 1 };
    (shifted & mask) as u64
}

fn words_to_bytes(words: &[u64], exact_bit_len: u64) -> Vec<u8> {
    let mut bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
    let needed = ((exact_bit_len + 7) / 8) as usize;
    bytes.truncate(needed.max(bytes.len().min(needed)));
    bytes.resize(needed, 0);
    bytes
}

enum Backing {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Backing {
    fn bytes(&self) -> &[u8] {
        match self {
            Backing::Owned(v) => v,
            Backing::Mapped(m) => m,
        }
    }
}

/// A compressed, rank/select-capable bitvector.
pub struct RrrBitvector {
    num_bits: u64,
    block_size: u32,
    superblock_size: u32,
    class_bits: u32,
    last_block_len: u32,
    num_blocks: u64,
    num_superblocks: u64,
    classes_bit_len: u64,
    offsets_bit_len: u64,
    classes_byte_off: usize,
    offsets_byte_off: usize,
    super_offsets_byte_off: usize,
    super_ranks_byte_off: usize,
    data_start: usize,
    backing: Backing,
}

impl RrrBitvector {
    /// Build a compressed bitvector from a plain bit sequence.
    pub fn from_bits(bits: &[bool]) -> BitvectorResult<Self> {
        Self::from_bits_with_params(bits, DEFAULT_BLOCK_SIZE, DEFAULT_SUPERBLOCK_SIZE)
    }

    pub fn from_bits_with_params(
        bits: &[bool],
        block_size: u32,
        superblock_size: u32,
    ) -> BitvectorResult<Self> {
        if block_size == 0 || block_size > 63 {
            return Err(BitvectorError::InvalidParameters(
                "block_size must be in 1..=63".to_string(),
            ));
        }
        if superblock_size == 0 {
            return Err(BitvectorError::InvalidParameters(
                "superblock_size must be at least 1".to_string(),
            ));
        }

        let num_bits = bits.len() as u64;
        let num_blocks = if num_bits == 0 {
            0
        } else {
            (num_bits + block_size as u64 - 1) / block_size as u64
        };
        let last_block_len = if num_blocks == 0 {
            0
        } else {
            let rem = num_bits - (num_blocks - 1) * block_size as u64;
            rem as u32
        };
        let num_superblocks = if num_blocks == 0 {
            0
        } else {
            (num_blocks + superblock_size as u64 - 1) / superblock_size as u64
        };
        let class_bits = bits_to_represent(block_size as u64);

        let mut classes = BitString::with_bit_capacity(num_blocks * class_bits as u64);
        let mut offsets = BitString::new();
        let mut super_offsets = Vec::with_capacity(num_superblocks as usize);
        let mut super_ranks = Vec::with_capacity(num_superblocks as usize);

        let mut running_rank: u64 = 0;
        for block_idx in 0..num_blocks {
            let len = if block_idx + 1 == num_blocks {
                last_block_len
            } else {
                block_size
            };
            let start = (block_idx * block_size as u64) as usize;
            let mut block_bits: u64 = 0;
            for local in 0..len as usize {
                if bits[start + local] {
                    block_bits |= 1u64 << local;
                }
            }
            let class = block_bits.count_ones();
            classes.push_bits(class as u64, class_bits);

            let class_count = binomial(len as u64, class as u64);
            let width = offset_width(class_count);
            if width > 0 {
                let offset = rank_combination(block_bits, class);
                offsets.push_bits(offset, width);
            }

            running_rank += class as u64;

            if (block_idx + 1) % superblock_size as u64 == 0 || block_idx + 1 == num_blocks {
                super_ranks.push(running_rank);
                super_offsets.push(offsets.len_bits());
            }
        }

        let classes_bit_len = classes.len_bits();
        let offsets_bit_len = offsets.len_bits();
        let classes_bytes = words_to_bytes(classes.as_words(), classes_bit_len);
        let offsets_bytes = words_to_bytes(offsets.as_words(), offsets_bit_len);

        let mut buffer = Vec::with_capacity(
            classes_bytes.len() + offsets_bytes.len() + super_offsets.len() * 8 + super_ranks.len() * 8,
        );
        let classes_byte_off = buffer.len();
        buffer.extend_from_slice(&classes_bytes);
        let offsets_byte_off = buffer.len();
        buffer.extend_from_slice(&offsets_bytes);
        let super_offsets_byte_off = buffer.len();
        for v in &super_offsets {
            buffer.extend_from_slice(&v.to_le_bytes());
        }
        let super_ranks_byte_off = buffer.len();
        for v in &super_ranks {
            buffer.extend_from_slice(&v.to_le_bytes());
        }

        Ok(Self {
            num_bits,
            block_size,
            superblock_size,
            class_bits,
            last_block_len,
            num_blocks,
            num_superblocks,
            classes_bit_len,
            offsets_bit_len,
            classes_byte_off,
            offsets_byte_off,
            super_offsets_byte_off,
            super_ranks_byte_off,
            data_start: 0,
            backing: Backing::Owned(buffer),
        })
    }

    fn data(&self) -> &[u8] {
        &self.backing.bytes()[self.data_start..]
    }

    fn super_rank_before(&self, superblock_idx: u64) -> u64 {
        if superblock_idx == 0 {
            0
        } else {
            let off = self.super_ranks_byte_off + ((superblock_idx - 1) as usize) * 8;
            u64::from_le_bytes(self.backing.bytes()[self.data_start + off..self.data_start + off + 8].try_into().unwrap())
        }
    }

    fn super_offset_before(&self, superblock_idx: u64) -> u64 {
        if superblock_idx == 0 {
            0
        } else {
            let off = self.super_offsets_byte_off + ((superblock_idx - 1) as usize) * 8;
            u64::from_le_bytes(self.backing.bytes()[self.data_start + off..self.data_start + off + 8].try_into().unwrap())
        }
    }

    fn block_len(&self, block_idx: u64) -> u32 {
        if block_idx + 1 == self.num_blocks {
            self.last_block_len
        } else {
            self.block_size
        }
    }

    fn block_class(&self, block_idx: u64) -> u32 {
        let classes_bytes = &self.data()[self.classes_byte_off..self.offsets_byte_off.max(self.classes_byte_off)];
        let bit_pos = block_idx * self.class_bits as u64;
        read_bits_from_bytes(classes_bytes, bit_pos, self.class_bits) as u32
    }

    /// Returns `(block_bits, len)` for the block, plus the offsets-bit
    /// cursor advanced past it (for sequential callers).
    fn decode_block_at(&self, block_idx: u64, offsets_cursor: u64) -> (u64, u32, u64) {
        let len = self.block_len(block_idx);
        let class = self.block_class(block_idx);
        let class_count = binomial(len as u64, class as u64);
        let width = offset_width(class_count);
        let offsets_bytes = &self.data()[self.offsets_byte_off..];
        let offset = if width > 0 {
            read_bits_from_bytes(offsets_bytes, offsets_cursor, width)
        } else {
            0
        };
        let bits = unrank_combination(offset, class, len);
        (bits, class, offsets_cursor + width as u64)
    }

    pub fn len(&self) -> u64 {
        self.num_bits
    }

    pub fn is_empty(&self) -> bool {
        self.num_bits == 0
    }

    fn check_bounds(&self, position: u64) -> BitvectorResult<()> {
        if position >= self.num_bits {
            return Err(BitvectorError::OutOfBounds {
                position,
                len: self.num_bits,
            });
        }
        Ok(())
    }

    pub fn access(&self, position: u64) -> BitvectorResult<bool> {
        self.check_bounds(position)?;
        let block_idx = position / self.block_size as u64;
        let superblock_idx = block_idx / self.superblock_size as u64;
        let sb_first_block = superblock_idx * self.superblock_size as u64;
        let mut cursor = self.super_offset_before(superblock_idx);
        let mut bits = 0u64;
        for b in sb_first_block..=block_idx {
            let (decoded, _class, next_cursor) = self.decode_block_at(b, cursor);
            cursor = next_cursor;
            bits = decoded;
        }
        let local = (position - block_idx * self.block_size as u64) as u32;
        Ok((bits >> local) & 1 == 1)
    }

    /// Count of `1` bits in `[0, position]`.
    pub fn rank1(&self, position: u64) -> BitvectorResult<u64> {
        self.check_bounds(position)?;
        let block_idx = position / self.block_size as u64;
        let superblock_idx = block_idx / self.superblock_size as u64;
        let sb_first_block = superblock_idx * self.superblock_size as u64;
        let mut rank = self.super_rank_before(superblock_idx);
        let mut cursor = self.super_offset_before(superblock_idx);
        for b in sb_first_block..block_idx {
            let class = self.block_class(b);
            let len = self.block_len(b);
            let width = offset_width(binomial(len as u64, class as u64));
            rank += class as u64;
            cursor += width as u64;
        }
        let (bits, _class, _cursor) = self.decode_block_at(block_idx, cursor);
        let local = (position - block_idx * self.block_size as u64) as u32;
        let mask = if local == 63 { u64::MAX } else { (1u64 << (local + 1)) - 1 };
        rank += (bits & mask).count_ones() as u64;
        Ok(rank)
    }

    /// Count of `0` bits in `[0, position]`.
    pub fn rank0(&self, position: u64) -> BitvectorResult<u64> {
        Ok(position + 1 - self.rank1(position)?)
    }

    /// Position of the `n`-th (1-indexed) `1` bit, or `len()` if fewer
    /// than `n` ones exist.
    pub fn select1(&self, n: u64) -> BitvectorResult<u64> {
        if n == 0 {
            return Err(BitvectorError::InvalidParameters("select is 1-indexed".to_string()));
        }
        if self.num_superblocks == 0 {
            return Ok(self.num_bits);
        }
        // Binary search the superblock whose cumulative rank first reaches n.
        let mut lo = 0u64;
        let mut hi = self.num_superblocks - 1;
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.super_rank_before(mid + 1) >= n {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        let superblock_idx = lo;
        let mut rank = self.super_rank_before(superblock_idx);
        let mut cursor = self.super_offset_before(superblock_idx);
        let sb_first_block = superblock_idx * self.superblock_size as u64;
        let sb_last_block = ((superblock_idx + 1) * self.superblock_size as u64).min(self.num_blocks);
        for block_idx in sb_first_block..sb_last_block {
            let (bits, class, next_cursor) = self.decode_block_at(block_idx, cursor);
            cursor = next_cursor;
            if rank + class as u64 >= n {
                let needed = n - rank;
                let mut seen = 0u64;
                let len = self.block_len(block_idx);
                for local in 0..len {
                    if (bits >> local) & 1 == 1 {
                        seen += 1;
                        if seen == needed {
                            return Ok(block_idx * self.block_size as u64 + local as u64);
                        }
                    }
                }
            }
            rank += class as u64;
        }
        Ok(self.num_bits)
    }

    /// Position of the `n`-th (1-indexed) `0` bit, or `len()` if fewer
    /// than `n` zeros exist.
    pub fn select0(&self, n: u64) -> BitvectorResult<u64> {
        if n == 0 {
            return Err(BitvectorError::InvalidParameters("select is 1-indexed".to_string()));
        }
        // Binary search directly over positions using rank0, since there is
        // no cached zero-rank superblock array; O(log N) overall.
        let (mut lo, mut hi) = (0u64, self.num_bits);
        while lo < hi {
            let mid = (lo + hi) / 2;
            let r0 = self.rank0(mid)?;
            if r0 >= n {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        if lo >= self.num_bits {
            return Ok(self.num_bits);
        }
        Ok(lo)
    }

    /// Total serialized size in bytes, counting the header and every
    /// array: `c_offsets_size, classes_size, num_of_bits, num_of_blocks,
    /// num_of_superblocks, superblockoffsets_size, superblockranks_size,
    /// blocksize, class_bits, last_block_len, superblockoffsets_bits,
    /// superblockranks_bits, superblocksize`, followed by the four data
    /// arrays, in that exact order.
    pub fn file_size(&self) -> u64 {
        (HEADER_BYTES + self.backing.bytes().len()) as u64
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> BitvectorResult<()> {
        let mut file = File::create(path).map_err(BitvectorError::Io)?;
        let header = [
            self.offsets_bit_len,
            self.classes_bit_len,
            self.num_bits,
            self.num_blocks,
            self.num_superblocks,
            self.num_superblocks,
            self.num_superblocks,
            self.block_size as u64,
            self.class_bits as u64,
            self.last_block_len as u64,
            64,
            64,
            self.superblock_size as u64,
        ];
        debug_assert_eq!(header.len(), HEADER_FIELDS);
        for field in header {
            file.write_all(&field.to_le_bytes()).map_err(BitvectorError::Io)?;
        }
        file.write_all(self.backing.bytes()).map_err(BitvectorError::Io)?;
        Ok(())
    }

    pub fn open_mmap<P: AsRef<Path>>(path: P) -> BitvectorResult<Self> {
        let file = File::open(path).map_err(BitvectorError::Io)?;
        let mmap = unsafe { Mmap::map(&file).map_err(BitvectorError::Io)? };
        if mmap.len() < HEADER_BYTES {
            return Err(BitvectorError::Corrupt("file shorter than header".to_string()));
        }
        let read_u64 = |idx: usize| -> u64 {
            u64::from_le_bytes(mmap[idx * 8..idx * 8 + 8].try_into().unwrap())
        };
        let offsets_bit_len = read_u64(0);
        let classes_bit_len = read_u64(1);
        let num_bits = read_u64(2);
        let num_blocks = read_u64(3);
        let num_superblocks = read_u64(4);
        let _superblockoffsets_size = read_u64(5);
        let _superblockranks_size = read_u64(6);
        let block_size = read_u64(7) as u32;
        let class_bits = read_u64(8) as u32;
        let last_block_len = read_u64(9) as u32;
        let _superblockoffsets_bits = read_u64(10);
        let _superblockranks_bits = read_u64(11);
        let superblock_size = read_u64(12) as u32;

        let classes_byte_off = 0usize;
        let offsets_byte_off = classes_byte_off + ((classes_bit_len + 7) / 8) as usize;
        let super_offsets_byte_off = offsets_byte_off + ((offsets_bit_len + 7) / 8) as usize;
        let super_ranks_byte_off = super_offsets_byte_off + (num_superblocks as usize) * 8;
        let expected_len = HEADER_BYTES + super_ranks_byte_off + (num_superblocks as usize) * 8;
        if mmap.len() < expected_len {
            return Err(BitvectorError::Corrupt(format!(
                "expected at least {} bytes, file has {}",
                expected_len,
                mmap.len()
            )));
        }

        Ok(Self {
            num_bits,
            block_size,
            superblock_size,
            class_bits,
            last_block_len,
            num_blocks,
            num_superblocks,
            classes_bit_len,
            offsets_bit_len,
            classes_byte_off,
            offsets_byte_off,
            super_offsets_byte_off,
            super_ranks_byte_off,
            data_start: HEADER_BYTES,
            backing: Backing::Mapped(mmap),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_from_str(s: &str) -> Vec<bool> {
        s.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_binomial_basic_values() {
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(15, 0), 1);
        assert_eq!(binomial(15, 15), 1);
        assert_eq!(binomial(5, 7), 0);
    }

    #[test]
    fn test_combination_rank_unrank_roundtrip() {
        for class in 0..=5u32 {
            for bits in 0..(1u64 << 5) {
                if bits.count_ones() != class {
                    continue;
                }
                let offset = rank_combination(bits, class);
                let decoded = unrank_combination(offset, class, 5);
                assert_eq!(decoded, bits, "class={} bits={:05b}", class, bits);
            }
        }
    }

    #[test]
    fn test_access_recovers_original_bits() {
        let bits = bits_from_str("1011001101011100101001");
        let bv = RrrBitvector::from_bits_with_params(&bits, 4, 3).unwrap();
        for (i, &b) in bits.iter().enumerate() {
            assert_eq!(bv.access(i as u64).unwrap(), b, "position {}", i);
        }
    }

    #[test]
    fn test_rank_matches_naive_popcount() {
        let bits = bits_from_str("110100110101110010110011101");
        let bv = RrrBitvector::from_bits_with_params(&bits, 5, 4).unwrap();
        let mut running = 0u64;
        for (i, &b) in bits.iter().enumerate() {
            if b {
                running += 1;
            }
            assert_eq!(bv.rank1(i as u64).unwrap(), running);
            assert_eq!(bv.rank0(i as u64).unwrap(), (i as u64 + 1) - running);
        }
    }

    #[test]
    fn test_select1_and_select0_are_rank_inverses() {
        let bits = bits_from_str("1001010011011000101");
        let bv = RrrBitvector::from_bits_with_params(&bits, 4, 2).unwrap();
        let ones = bits.iter().filter(|&&b| b).count() as u64;
        for k in 1..=ones {
            let pos = bv.select1(k).unwrap();
            assert!(bv.access(pos).unwrap());
            assert_eq!(bv.rank1(pos).unwrap(), k);
        }
        let zeros = bits.len() as u64 - ones;
        for k in 1..=zeros {
            let pos = bv.select0(k).unwrap();
            assert!(!bv.access(pos).unwrap());
            assert_eq!(bv.rank0(pos).unwrap(), k);
        }
    }

    #[test]
    fn test_write_then_open_mmap_roundtrips() {
        let bits = bits_from_str("101100110101110010110011101001011");
        let bv = RrrBitvector::from_bits_with_params(&bits, 6, 3).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.cbs");
        bv.write_to_file(&path).unwrap();
        let reopened = RrrBitvector::open_mmap(&path).unwrap();
        assert_eq!(reopened.len(), bv.len());
        for i in 0..bits.len() as u64 {
            assert_eq!(reopened.access(i).unwrap(), bv.access(i).unwrap());
            assert_eq!(reopened.rank1(i).unwrap(), bv.rank1(i).unwrap());
        }
    }

    #[test]
    fn test_out_of_bounds_access_is_an_error() {
        let bv = RrrBitvector::from_bits_with_params(&bits_from_str("101"), 4, 2).unwrap();
        assert!(bv.access(3).is_err());
    }

    #[test]
    fn test_empty_bitvector() {
        let bv = RrrBitvector::from_bits_with_params(&[], 15, 32).unwrap();
        assert_eq!(bv.len(), 0);
        assert!(bv.access(0).is_err());
    }
}
