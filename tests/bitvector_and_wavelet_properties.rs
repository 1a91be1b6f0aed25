//! Bitvector and wavelet-tree scenarios and invariant checks.

use gtcore::bitvector::{RrrBitvector, WaveletTree};

fn bits_from_hex_u128(value: u128, len: usize) -> Vec<bool> {
    (0..len).map(|i| (value >> i) & 1 == 1).collect()
}

// Scenario 5: 128 bits, b=15, s=32, with the high and low 32-bit halves of
// each 64-bit word set.
#[test]
fn scenario_bitvector_round_trip() {
    let value: u128 = 0x00000000_FFFFFFFF_00000000_FFFFFFFFu128;
    let bits = bits_from_hex_u128(value, 128);
    let bv = RrrBitvector::from_bits_with_params(&bits, 15, 32).unwrap();

    assert_eq!(bv.rank1(31).unwrap(), 0);
    assert_eq!(bv.rank1(63).unwrap(), 32);
    assert_eq!(bv.rank1(127).unwrap(), 64);
    assert_eq!(bv.select1(1).unwrap(), 32);
    assert_eq!(bv.select0(1).unwrap(), 0);
}

#[test]
fn bitvector_rank0_rank1_are_complementary() {
    let bits: Vec<bool> = (0..500).map(|i| i % 7 == 0 || i % 11 == 0).collect();
    let bv = RrrBitvector::from_bits(&bits).unwrap();
    for i in 0..bv.len() {
        assert_eq!(bv.rank1(i).unwrap() + bv.rank0(i).unwrap(), i + 1);
    }
}

#[test]
fn bitvector_select_is_rank_inverse() {
    let bits: Vec<bool> = (0..400).map(|i| (i * 13) % 5 == 0).collect();
    let bv = RrrBitvector::from_bits(&bits).unwrap();
    let ones = bv.rank1(bv.len() - 1).unwrap();
    for k in 1..=ones {
        let pos = bv.select1(k).unwrap();
        assert!(bv.access(pos).unwrap());
        assert_eq!(bv.rank1(pos).unwrap(), k);
    }
    let zeros = bv.rank0(bv.len() - 1).unwrap();
    for k in 1..=zeros {
        let pos = bv.select0(k).unwrap();
        assert!(!bv.access(pos).unwrap());
        assert_eq!(bv.rank0(pos).unwrap(), k);
    }
}

#[test]
fn bitvector_access_recovers_original_sequence() {
    let bits: Vec<bool> = (0..300).map(|i| (i * 7 + 3) % 4 == 0).collect();
    let bv = RrrBitvector::from_bits_with_params(&bits, 9, 4).unwrap();
    for (i, &bit) in bits.iter().enumerate() {
        assert_eq!(bv.access(i as u64).unwrap(), bit);
    }
}

#[test]
fn bitvector_write_then_open_mmap_round_trips() {
    let bits: Vec<bool> = (0..200).map(|i| i % 3 == 0).collect();
    let bv = RrrBitvector::from_bits(&bits).unwrap();
    let tmp = tempfile::NamedTempFile::new().unwrap();
    bv.write_to_file(tmp.path()).unwrap();
    let loaded = RrrBitvector::open_mmap(tmp.path()).unwrap();
    for i in 0..bits.len() as u64 {
        assert_eq!(loaded.access(i).unwrap(), bv.access(i).unwrap());
        assert_eq!(loaded.rank1(i).unwrap(), bv.rank1(i).unwrap());
    }
}

fn dna_to_symbols(s: &str) -> Vec<u32> {
    s.bytes()
        .map(|b| match b {
            b'A' => 0,
            b'C' => 1,
            b'G' => 2,
            b'T' => 3,
            _ => unreachable!(),
        })
        .collect()
}

// Scenario 6: ACGTACGT over alphabet {A,C,G,T}.
#[test]
fn scenario_wavelet_access_rank_select() {
    let symbols = dna_to_symbols("ACGTACGT");
    let wt = WaveletTree::build(&symbols, 4).unwrap();

    assert_eq!(wt.access(4).unwrap(), 0); // 'A'
    assert_eq!(wt.rank(3, 7).unwrap(), 2); // rank(7, 'T')
    assert_eq!(wt.select(2, 2).unwrap(), 6); // select(2, 'G')
}

#[test]
fn wavelet_rank_matches_naive_count_over_full_sequence() {
    let symbols: Vec<u32> = (0..200).map(|i| (i * 3 + 1) % 5).collect();
    let wt = WaveletTree::build(&symbols, 5).unwrap();
    for symbol in 0..5u32 {
        let expected = symbols.iter().filter(|&&s| s == symbol).count() as u64;
        assert_eq!(wt.rank(symbol, symbols.len() as u64 - 1).unwrap(), expected);
    }
}

#[test]
fn wavelet_access_select_are_inverses() {
    let symbols: Vec<u32> = (0..150).map(|i| (i * 7 + 2) % 6).collect();
    let wt = WaveletTree::build(&symbols, 6).unwrap();
    for symbol in 0..6u32 {
        let count = symbols.iter().filter(|&&s| s == symbol).count() as u64;
        for k in 1..=count {
            let pos = wt.select(symbol, k).unwrap();
            assert_eq!(wt.access(pos).unwrap(), symbol);
            assert_eq!(wt.rank(symbol, pos).unwrap(), k);
        }
    }
}
