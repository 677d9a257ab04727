// crates/ghostsub-core/src/engine.rs

use tracing::{debug, warn};

use crate::artifact::checksum::hex;
use crate::replace::{contains, replace_all};
use crate::rule::{DictionaryLog, SubstitutionRule};
use crate::scan::missing::MissingQueue;
use crate::scan::scorer::Candidate;
use crate::token::{ByteSet, SequenceToken};

/// Iteration limit shared by every pass of a run. `None` is unbounded.
#[derive(Clone, Copy, Debug)]
pub struct IterationBudget {
    limit: Option<u64>,
    used: u64,
}

impl IterationBudget {
    pub fn new(limit: Option<u64>, used: u64) -> Self {
        Self { limit, used }
    }

    pub fn exhausted(&self) -> bool {
        self.limit.map_or(false, |l| self.used >= l)
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    fn record(&mut self) {
        self.used += 1;
    }
}

/// Why a pass stopped walking the ranked candidates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassStop {
    CandidatesExhausted,
    QueueExhausted,
    /// A candidate reused a byte value of a sequence replaced earlier in the pass.
    ByteConflict,
    BudgetExhausted,
}

/// Why `try_substitute` refused a `(missing, substituted)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The free token occurs in the buffer, so it is unusable for any candidate.
    Stale,
    /// The substituted sequence no longer occurs.
    NoOccurrence,
    /// Reverse replacement does not reproduce the buffer.
    RoundTrip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassOutcome {
    pub commits: usize,
    pub conflicts: usize,
    /// Free tokens dropped from the queue because they reappeared in the buffer.
    pub discarded: usize,
    pub stop: PassStop,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub passes: u64,
    pub commits: u64,
    pub conflicts: u64,
    pub discarded: u64,
}

/// Greedy single-threaded committer over one exclusively owned buffer.
#[derive(Debug, Default)]
pub struct SubstitutionEngine {
    pub stats: EngineStats,
}

impl SubstitutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk `candidates` in rank order, committing every substitution that
    /// survives the round-trip check.
    ///
    /// The ranking was computed against the buffer as it was before the pass.
    /// Once a candidate shares a byte value with a sequence already replaced in
    /// this pass its counts can no longer be trusted, so the pass ends there.
    /// Free tokens are drawn in ascending order, skipping any whose bytes
    /// overlap a token committed earlier in the same pass. A drawn token that
    /// has appeared in the buffer since the length was scanned is dropped and
    /// the next one is drawn for the same candidate; a token refused for a
    /// pair-specific reason goes back to the queue.
    pub fn run_pass(
        &mut self,
        buffer: &mut Vec<u8>,
        log: &mut DictionaryLog,
        queue: &mut MissingQueue,
        candidates: &[Candidate],
        budget: &mut IterationBudget,
    ) -> PassOutcome {
        let mut used_substituted = ByteSet::new();
        let mut used_missing = ByteSet::new();
        let mut commits = 0usize;
        let mut conflicts = 0usize;
        let mut discarded = 0usize;
        let mut stop = PassStop::CandidatesExhausted;

        for cand in candidates {
            if budget.exhausted() {
                stop = PassStop::BudgetExhausted;
                break;
            }
            let sub = cand.token.as_bytes();
            if used_substituted.intersects(sub) {
                stop = PassStop::ByteConflict;
                break;
            }

            let drawn = loop {
                let Some(missing) = queue.pop_first_where(|t| !used_missing.intersects(t)) else {
                    break None;
                };
                match try_substitute(buffer, &missing, &cand.token) {
                    Err(Rejection::Stale) => {
                        debug!(missing = %hex(missing.as_bytes()), "free token now present; dropped");
                        discarded += 1;
                    }
                    result => break Some((missing, result)),
                }
            };
            let Some((missing, result)) = drawn else {
                stop = PassStop::QueueExhausted;
                break;
            };

            match result {
                Ok(next) => {
                    debug!(
                        iteration = budget.used() + 1,
                        missing = %hex(missing.as_bytes()),
                        substituted = %hex(sub),
                        score = cand.score,
                        before = buffer.len(),
                        after = next.len(),
                        "rule committed"
                    );
                    *buffer = next;
                    used_substituted.insert_all(sub);
                    used_missing.insert_all(missing.as_bytes());
                    log.push(SubstitutionRule::new(missing, cand.token.clone()));
                    budget.record();
                    commits += 1;
                }
                Err(reason) => {
                    warn!(
                        missing = %hex(missing.as_bytes()),
                        substituted = %hex(sub),
                        reason = ?reason,
                        "replacement rejected"
                    );
                    queue.requeue(&missing);
                    conflicts += 1;
                }
            }
        }

        self.stats.passes += 1;
        self.stats.commits += commits as u64;
        self.stats.conflicts += conflicts as u64;
        self.stats.discarded += discarded as u64;

        PassOutcome {
            commits,
            conflicts,
            discarded,
            stop,
        }
    }
}

/// Forward-replace `substituted` with `missing` and return the new buffer if
/// the result is an exact inverse of the reverse replacement.
pub fn try_substitute(
    buffer: &[u8],
    missing: &SequenceToken,
    substituted: &SequenceToken,
) -> Result<Vec<u8>, Rejection> {
    if contains(buffer, missing.as_bytes()) {
        return Err(Rejection::Stale);
    }
    let forward = replace_all(buffer, substituted.as_bytes(), missing.as_bytes());
    if forward.len() == buffer.len() && forward == buffer {
        return Err(Rejection::NoOccurrence);
    }
    let back = replace_all(&forward, missing.as_bytes(), substituted.as_bytes());
    if back == buffer {
        Ok(forward)
    } else {
        Err(Rejection::RoundTrip)
    }
}
