// crates/ghostsub-core/src/scan/missing.rs

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{GhostError, Result};
use crate::scan::{default_workers, partition};
use crate::token::{SequenceToken, MAX_TOKEN_LEN};

/// Default cap on `256^length`: lengths 1..=3 enumerate, 4+ fail soft.
pub const DEFAULT_UNIVERSE_LIMIT: u64 = 1 << 24;

/// Each worker owns a full-universe bitset, so small buffers use fewer workers.
pub const DEFAULT_MIN_CHUNK: usize = 1 << 16;

#[derive(Clone, Debug)]
pub struct FinderConfig {
    pub workers: usize,
    /// Fewest window start offsets handed to one worker.
    pub min_chunk: usize,
    /// Largest token universe (`256^length`) the finder will materialize.
    pub universe_limit: u64,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            min_chunk: DEFAULT_MIN_CHUNK,
            universe_limit: DEFAULT_UNIVERSE_LIMIT,
        }
    }
}

/// `256^length`, or `None` when it does not fit a u64.
pub fn universe_size(length: usize) -> Option<u64> {
    256u64.checked_pow(u32::try_from(length).ok()?)
}

/// Tokens of one length that do not occur in a buffer, kept as a dense
/// bitset over the token universe. Bit `i` stands for the token whose
/// big-endian value is `i`, so ascending bit order is ascending
/// lexicographic byte order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingTokens {
    length: usize,
    absent: Vec<u64>,
    count: usize,
}

impl MissingTokens {
    fn empty(length: usize) -> Self {
        Self {
            length,
            absent: Vec::new(),
            count: 0,
        }
    }

    pub fn token_len(&self) -> usize {
        self.length
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains(&self, token: &[u8]) -> bool {
        token.len() == self.length && bit_is_set(&self.absent, index_of(token))
    }

    /// Absent tokens in ascending byte order.
    pub fn iter(&self) -> impl Iterator<Item = SequenceToken> + '_ {
        set_bits(&self.absent, 0).map(move |idx| token_at(idx, self.length))
    }

    pub fn to_vec(&self) -> Vec<SequenceToken> {
        self.iter().collect()
    }

    pub fn into_queue(self) -> MissingQueue {
        MissingQueue {
            length: self.length,
            bits: self.absent,
            remaining: self.count,
            front_word: 0,
        }
    }
}

/// Scan `buf` for every `length`-byte window and return the complement.
///
/// Windows are partitioned by start offset; each worker reads its slice
/// extended by `length - 1` bytes so no window straddling a boundary is lost
/// and none is seen twice. The result does not depend on `cfg.workers`.
///
/// A universe above `cfg.universe_limit` is not an error: the scan is
/// skipped with a warning and an empty set is returned.
pub fn find_missing(buf: &[u8], length: usize, cfg: &FinderConfig) -> Result<MissingTokens> {
    if length == 0 || length > MAX_TOKEN_LEN {
        return Err(GhostError::Validation(format!(
            "missing token length must be in 1..=255, got {length}"
        )));
    }

    let universe = match universe_size(length) {
        Some(u) if u <= cfg.universe_limit => u,
        other => {
            warn!(
                length,
                universe = ?other,
                limit = cfg.universe_limit,
                "free-token universe too large to enumerate; treating length as exhausted"
            );
            return Ok(MissingTokens::empty(length));
        }
    };

    let words = ((universe + 63) / 64) as usize;
    let positions = buf.len().saturating_sub(length - 1);
    let parts = if buf.len() >= length {
        let workers = cfg.workers.min(positions / cfg.min_chunk.max(1) + 1);
        partition(positions, workers)
    } else {
        Vec::new()
    };

    let partials: Vec<Vec<u64>> = parts
        .into_par_iter()
        .map(|r| {
            let window_end = r.end + length - 1;
            present_bits(&buf[r.start..window_end], length, universe, words)
        })
        .collect();

    // Merge after every worker finished.
    let mut present = vec![0u64; words];
    for part in &partials {
        for (acc, w) in present.iter_mut().zip(part) {
            *acc |= *w;
        }
    }
    drop(partials);

    let mut absent: Vec<u64> = present.iter().map(|w| !w).collect();
    let tail_bits = (universe % 64) as u32;
    if tail_bits != 0 {
        if let Some(last) = absent.last_mut() {
            *last &= (1u64 << tail_bits) - 1;
        }
    }
    let count = absent.iter().map(|w| w.count_ones() as usize).sum();

    debug!(length, absent = count, universe, "missing-token scan done");
    Ok(MissingTokens {
        length,
        absent,
        count,
    })
}

fn present_bits(chunk: &[u8], length: usize, universe: u64, words: usize) -> Vec<u64> {
    let mut bits = vec![0u64; words];
    if chunk.len() < length {
        return bits;
    }
    let mask = universe - 1;
    let mut idx = index_of(&chunk[..length]);
    bits[(idx >> 6) as usize] |= 1u64 << (idx & 63);
    for &b in &chunk[length..] {
        idx = ((idx << 8) | b as u64) & mask;
        bits[(idx >> 6) as usize] |= 1u64 << (idx & 63);
    }
    bits
}

/// Ascending queue of free tokens for one length.
///
/// Popped tokens leave the queue; `requeue` puts a token back in its sorted
/// position, so the queue is always the remaining tokens in byte order.
#[derive(Clone, Debug)]
pub struct MissingQueue {
    length: usize,
    bits: Vec<u64>,
    remaining: usize,
    // Every word before this one is zero.
    front_word: usize,
}

impl MissingQueue {
    pub fn token_len(&self) -> usize {
        self.length
    }

    pub fn len(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    pub fn pop_front(&mut self) -> Option<SequenceToken> {
        self.pop_first_where(|_| true)
    }

    /// Remove and return the smallest queued token accepted by `pred`.
    /// Tokens it passes over stay queued.
    pub fn pop_first_where<F>(&mut self, mut pred: F) -> Option<SequenceToken>
    where
        F: FnMut(&[u8]) -> bool,
    {
        let mut scratch = [0u8; 8];
        let hit = set_bits(&self.bits, self.front_word).find(|&idx| {
            write_token(idx, &mut scratch[..self.length]);
            pred(&scratch[..self.length])
        })?;

        self.bits[(hit >> 6) as usize] &= !(1u64 << (hit & 63));
        self.remaining -= 1;
        while self.front_word < self.bits.len() && self.bits[self.front_word] == 0 {
            self.front_word += 1;
        }
        Some(token_at(hit, self.length))
    }

    /// Return a popped token to the queue.
    pub fn requeue(&mut self, token: &SequenceToken) {
        if token.len() != self.length || self.bits.is_empty() {
            return;
        }
        let idx = index_of(token.as_bytes());
        let word = (idx >> 6) as usize;
        if word >= self.bits.len() || bit_is_set(&self.bits, idx) {
            return;
        }
        self.bits[word] |= 1u64 << (idx & 63);
        self.remaining += 1;
        self.front_word = self.front_word.min(word);
    }
}

fn index_of(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn write_token(mut idx: u64, out: &mut [u8]) {
    for slot in out.iter_mut().rev() {
        *slot = (idx & 0xFF) as u8;
        idx >>= 8;
    }
}

fn token_at(idx: u64, length: usize) -> SequenceToken {
    let mut buf = [0u8; 8];
    write_token(idx, &mut buf[..length]);
    SequenceToken::new(&buf[..length]).expect("universe lengths are 1..=7")
}

fn bit_is_set(bits: &[u64], idx: u64) -> bool {
    bits.get((idx >> 6) as usize)
        .map_or(false, |w| w & (1u64 << (idx & 63)) != 0)
}

fn set_bits(bits: &[u64], from_word: usize) -> impl Iterator<Item = u64> + '_ {
    bits.iter()
        .enumerate()
        .skip(from_word)
        .flat_map(|(wi, &w)| {
            let mut w = w;
            std::iter::from_fn(move || {
                if w == 0 {
                    return None;
                }
                let tz = w.trailing_zeros() as u64;
                w &= w - 1;
                Some(((wi as u64) << 6) | tz)
            })
        })
}
