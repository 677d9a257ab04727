// crates/ghostsub-core/tests/determinism.rs

use std::collections::HashMap;

use ghostsub_core::scan::missing::{find_missing, FinderConfig, DEFAULT_UNIVERSE_LIMIT};
use ghostsub_core::scan::scorer::{rank_candidates, rank_order, Candidate, CountBackend, ScorerConfig};
use ghostsub_core::SequenceToken;

fn lcg_next(x: &mut u64) -> u64 {
    // deterministic, not crypto
    *x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
    *x
}

/// Bytes drawn from a small alphabet so windows repeat.
fn sample(seed: u64, n: usize, alphabet: u8) -> Vec<u8> {
    let mut s = seed;
    (0..n)
        .map(|_| b'a' + ((lcg_next(&mut s) >> 56) as u8 % alphabet))
        .collect()
}

fn finder(workers: usize) -> FinderConfig {
    FinderConfig {
        workers,
        min_chunk: 1,
        universe_limit: DEFAULT_UNIVERSE_LIMIT,
    }
}

#[test]
fn missing_tokens_independent_of_worker_count() {
    for (seed, n, alphabet) in [(1u64, 0usize, 4u8), (2, 1, 4), (3, 97, 5), (4, 5_000, 20), (5, 20_000, 26)] {
        let buf = sample(seed, n, alphabet);
        for length in 1..=3usize {
            let single = find_missing(&buf, length, &finder(1)).unwrap();
            for workers in [2usize, 3, 8, 31] {
                let multi = find_missing(&buf, length, &finder(workers)).unwrap();
                assert_eq!(single, multi, "seed={seed} n={n} len={length} workers={workers}");
            }
            if length < 3 {
                let toks = single.to_vec();
                assert!(toks.windows(2).all(|w| w[0] < w[1]), "not ascending");
                for t in &toks {
                    assert!(!buf.windows(length).any(|w| w == t.as_bytes()));
                }
                let expected_absent = 256usize.pow(length as u32)
                    - buf.windows(length).collect::<std::collections::HashSet<_>>().len();
                assert_eq!(toks.len(), expected_absent);
            }
        }
    }
}

/// Straight count of every window, no partitioning, no packing.
fn brute_force(buf: &[u8], missing_len: usize, max_len: usize, top_n: usize) -> Vec<Candidate> {
    let mut merged = Vec::new();
    for len in (missing_len + 1)..=max_len {
        if len > buf.len() {
            break;
        }
        let mut seen: HashMap<&[u8], (u64, usize)> = HashMap::new();
        for (i, w) in buf.windows(len).enumerate() {
            let e = seen.entry(w).or_insert((0, i));
            e.0 += 1;
        }
        let mut per_len: Vec<Candidate> = seen
            .into_iter()
            .filter(|(_, (c, _))| *c > 1)
            .map(|(w, (count, first))| Candidate {
                token: SequenceToken::new(w).unwrap(),
                score: count * (len - missing_len) as u64,
                count,
                first_seen: first,
            })
            .collect();
        per_len.sort_by(rank_order);
        per_len.truncate(top_n);
        merged.extend(per_len);
    }
    merged.sort_by(rank_order);
    merged.truncate(top_n);
    merged
}

#[test]
fn scorer_backends_match_brute_force() {
    for (seed, n, alphabet) in [(11u64, 300usize, 3u8), (12, 2_000, 6), (13, 4_096, 2)] {
        let buf = sample(seed, n, alphabet);
        for (missing_len, max_len, top_n) in [(1usize, 12usize, 256usize), (2, 9, 40), (1, 3, 5)] {
            let expected = brute_force(&buf, missing_len, max_len, top_n);
            for backend in [CountBackend::Windows, CountBackend::Packed] {
                for workers in [1usize, 7] {
                    let cfg = ScorerConfig {
                        top_n,
                        workers,
                        backend,
                    };
                    let got = rank_candidates(&buf, missing_len, max_len, &cfg).unwrap();
                    assert_eq!(
                        got, expected,
                        "seed={seed} backend={backend:?} workers={workers} m={missing_len} max={max_len}"
                    );
                }
            }
        }
    }
}
