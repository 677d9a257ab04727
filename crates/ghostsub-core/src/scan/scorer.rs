// crates/ghostsub-core/src/scan/scorer.rs

use std::cmp::Ordering;
use std::collections::HashMap;
use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::error::{GhostError, Result};
use crate::scan::{default_workers, partition};
use crate::token::{SequenceToken, MAX_TOKEN_LEN};

/// Widest window the packed backend can hold in a u64 key.
pub const PACKED_MAX_LEN: usize = 8;

/// How window occurrences are tallied. Both produce identical rankings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CountBackend {
    /// Group windows by their byte slice.
    Windows,
    /// Pack windows of up to 8 bytes into u64 keys; wider windows use `Windows`.
    #[default]
    Packed,
}

#[derive(Clone, Debug)]
pub struct ScorerConfig {
    /// Candidates kept per length and in the merged ranking.
    pub top_n: usize,
    pub workers: usize,
    pub backend: CountBackend,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            top_n: 256,
            workers: default_workers(),
            backend: CountBackend::default(),
        }
    }
}

/// A repeated window worth replacing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub token: SequenceToken,
    /// `count * (token.len() - missing_len)`: bytes saved, ignoring rule overhead.
    pub score: u64,
    /// Occurrences over all start offsets, overlapping ones included.
    pub count: u64,
    /// Offset of the first occurrence; breaks ties after length.
    pub first_seen: usize,
}

/// Score descending, then shorter token, then earlier first occurrence.
pub fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.token.len().cmp(&b.token.len()))
        .then_with(|| a.first_seen.cmp(&b.first_seen))
}

#[derive(Clone, Copy, Debug)]
struct Tally {
    count: u64,
    first: usize,
}

impl Tally {
    fn absorb(&mut self, other: Tally) {
        self.count += other.count;
        self.first = self.first.min(other.first);
    }
}

/// Rank repeated windows of every length in `(missing_len, max_len]`.
///
/// Each length is counted separately and keeps its own top `top_n`; the
/// survivors are merged, re-ranked with `rank_order` and cut to `top_n`.
/// Scratch maps live only for the length being counted.
pub fn rank_candidates(
    buf: &[u8],
    missing_len: usize,
    max_len: usize,
    cfg: &ScorerConfig,
) -> Result<Vec<Candidate>> {
    if missing_len == 0 {
        return Err(GhostError::Validation("missing_len must be >= 1".into()));
    }
    if max_len > MAX_TOKEN_LEN {
        return Err(GhostError::TokenOverflow { len: max_len });
    }
    if cfg.top_n == 0 {
        return Ok(Vec::new());
    }

    let mut merged: Vec<Candidate> = Vec::new();
    for len in (missing_len + 1)..=max_len.min(buf.len()) {
        let repeated = match cfg.backend {
            CountBackend::Packed if len <= PACKED_MAX_LEN => count_packed(buf, len, cfg.workers),
            _ => count_windows(buf, len, cfg.workers),
        };
        let distinct = repeated.len();
        let gain = (len - missing_len) as u64;

        let mut scored: Vec<(usize, Tally)> = repeated;
        let by_rank = |a: &(usize, Tally), b: &(usize, Tally)| {
            b.1.count.cmp(&a.1.count).then_with(|| a.1.first.cmp(&b.1.first))
        };
        if scored.len() > cfg.top_n {
            scored.select_nth_unstable_by(cfg.top_n - 1, by_rank);
            scored.truncate(cfg.top_n);
        }
        scored.sort_unstable_by(by_rank);

        debug!(len, repeated = distinct, kept = scored.len(), "scored window length");

        for (first, t) in scored {
            merged.push(Candidate {
                token: SequenceToken::new(&buf[first..first + len])?,
                score: t.count * gain,
                count: t.count,
                first_seen: t.first,
            });
        }
    }

    merged.sort_by(rank_order);
    merged.truncate(cfg.top_n);
    Ok(merged)
}

/// Repeated windows as `(first_offset, tally)`; the window is `buf[first..first + len]`.
fn count_windows(buf: &[u8], len: usize, workers: usize) -> Vec<(usize, Tally)> {
    let parts = window_parts(buf, len, workers);

    let partials: Vec<HashMap<&[u8], Tally>> = parts
        .into_par_iter()
        .map(|r| {
            let mut m: HashMap<&[u8], Tally> = HashMap::new();
            for s in r {
                m.entry(&buf[s..s + len])
                    .and_modify(|t| t.count += 1)
                    .or_insert(Tally { count: 1, first: s });
            }
            m
        })
        .collect();

    let mut total: HashMap<&[u8], Tally> = HashMap::new();
    for part in partials {
        for (w, t) in part {
            total.entry(w).and_modify(|acc| acc.absorb(t)).or_insert(t);
        }
    }

    total
        .into_values()
        .filter(|t| t.count > 1)
        .map(|t| (t.first, t))
        .collect()
}

fn count_packed(buf: &[u8], len: usize, workers: usize) -> Vec<(usize, Tally)> {
    debug_assert!(len <= PACKED_MAX_LEN);
    let mask = if len == PACKED_MAX_LEN {
        u64::MAX
    } else {
        (1u64 << (8 * len)) - 1
    };
    let parts = window_parts(buf, len, workers);

    let partials: Vec<HashMap<u64, Tally>> = parts
        .into_par_iter()
        .map(|r| {
            let mut m: HashMap<u64, Tally> = HashMap::new();
            if r.is_empty() {
                return m;
            }
            let mut key = pack(&buf[r.start..r.start + len]);
            for s in r.clone() {
                if s > r.start {
                    key = ((key << 8) | buf[s + len - 1] as u64) & mask;
                }
                m.entry(key)
                    .and_modify(|t| t.count += 1)
                    .or_insert(Tally { count: 1, first: s });
            }
            m
        })
        .collect();

    let mut total: HashMap<u64, Tally> = HashMap::new();
    for part in partials {
        for (k, t) in part {
            total.entry(k).and_modify(|acc| acc.absorb(t)).or_insert(t);
        }
    }

    total
        .into_values()
        .filter(|t| t.count > 1)
        .map(|t| (t.first, t))
        .collect()
}

fn window_parts(buf: &[u8], len: usize, workers: usize) -> Vec<Range<usize>> {
    if buf.len() < len {
        return Vec::new();
    }
    partition(buf.len() - len + 1, workers)
}

fn pack(window: &[u8]) -> u64 {
    window.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}
