// crates/ghostsub-core/src/driver.rs

use std::time::{Duration, Instant};

use tracing::info;

use crate::artifact::format::Artifact;
use crate::engine::{IterationBudget, PassStop, SubstitutionEngine};
use crate::error::{GhostError, Result};
use crate::scan::missing::{find_missing, universe_size, FinderConfig, MissingQueue};
use crate::scan::scorer::{rank_candidates, ScorerConfig};
use crate::token::MAX_TOKEN_LEN;

/// Run-scoped clock for progress stamps.
#[derive(Clone, Copy, Debug)]
pub struct RunContext {
    started: Instant,
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `[hh:mm:ss.mmm]`, saturating at `[99:59:59.999]+`.
    pub fn stamp(&self) -> String {
        format_stamp(self.elapsed())
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_stamp(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    if hours > 99 {
        return "[99:59:59.999]+".to_string();
    }
    format!(
        "[{:02}:{:02}:{:02}.{:03}]",
        hours,
        (secs % 3600) / 60,
        secs % 60,
        d.subsec_millis()
    )
}

#[derive(Clone, Debug)]
pub struct CompressConfig {
    /// Total rule count at which the run stops; `None` is unbounded.
    pub iterations: Option<u64>,
    /// Longest sequence considered for replacement, 1..=255.
    pub max_length: usize,
    /// Checkpoint once this many rules were committed since the last one
    /// (checked at pass boundaries). 0 checkpoints only at exit.
    pub checkpoint_every: u64,
    pub finder: FinderConfig,
    pub scorer: ScorerConfig,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            iterations: None,
            max_length: 8,
            checkpoint_every: 100,
            finder: FinderConfig::default(),
            scorer: ScorerConfig::default(),
        }
    }
}

/// Receives the full artifact at every checkpoint.
pub trait CheckpointSink {
    fn persist(&mut self, artifact: &Artifact) -> Result<()>;
}

impl<F> CheckpointSink for F
where
    F: FnMut(&Artifact) -> Result<()>,
{
    fn persist(&mut self, artifact: &Artifact) -> Result<()> {
        self(artifact)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStop {
    /// Every length up to `max_length` was swept.
    LengthsExhausted,
    BudgetExhausted,
}

/// What happened at one free-token length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LengthSummary {
    pub length: usize,
    pub free_tokens: usize,
    pub passes: u64,
    pub commits: u64,
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub iterations_start: u64,
    pub iterations_end: u64,
    pub initial_size: usize,
    pub final_size: usize,
    /// Iteration count at which the encoded artifact was smallest.
    pub best_iteration: u64,
    pub best_size: usize,
    pub checkpoints: u64,
    pub passes: u64,
    pub conflicts: u64,
    /// Free tokens dropped because a commit made them occur in the buffer.
    pub discarded: u64,
    pub lengths: Vec<LengthSummary>,
    pub stop: RunStop,
}

impl RunReport {
    pub fn commits(&self) -> u64 {
        self.iterations_end - self.iterations_start
    }

    pub fn ratio(&self) -> f64 {
        if self.initial_size == 0 {
            return 0.0;
        }
        self.final_size as f64 / self.initial_size as f64
    }
}

enum State {
    ScanLength(usize),
    SubstitutePass { length: usize, queue: MissingQueue },
    Done(RunStop),
}

/// Outer loop: sweep free-token lengths, run passes, checkpoint.
pub struct CompressionDriver {
    cfg: CompressConfig,
    ctx: RunContext,
    pub engine: SubstitutionEngine,
}

impl CompressionDriver {
    pub fn new(cfg: CompressConfig, ctx: RunContext) -> Result<Self> {
        if cfg.max_length == 0 || cfg.max_length > MAX_TOKEN_LEN {
            return Err(GhostError::Validation(format!(
                "max_length must be in 1..=255, got {}",
                cfg.max_length
            )));
        }
        Ok(Self {
            cfg,
            ctx,
            engine: SubstitutionEngine::new(),
        })
    }

    /// Continue compressing `artifact` in place. A fresh run starts from an
    /// artifact with no rules; a resumed run picks up its rule count as the
    /// iteration counter. The artifact is checkpointed at least once, on exit.
    pub fn run(
        &mut self,
        artifact: &mut Artifact,
        sink: &mut dyn CheckpointSink,
    ) -> Result<RunReport> {
        let iterations_start = artifact.rules.len() as u64;
        let mut budget = IterationBudget::new(self.cfg.iterations, iterations_start);

        let initial_size = artifact.encoded_len();
        let mut best_size = initial_size;
        let mut best_iteration = iterations_start;
        let mut since_checkpoint = 0u64;
        let mut checkpoints = 0u64;
        let stats_start = self.engine.stats;
        let mut lengths: Vec<LengthSummary> = Vec::new();

        let mut state = State::ScanLength(1);
        let stop = loop {
            state = match state {
                State::Done(stop) => break stop,

                State::ScanLength(n) if n > self.cfg.max_length => State::Done(RunStop::LengthsExhausted),
                State::ScanLength(_) if budget.exhausted() => State::Done(RunStop::BudgetExhausted),
                State::ScanLength(n) => {
                    info!(stamp = %self.ctx.stamp(), length = n, "processing sequence length");
                    let missing = find_missing(&artifact.payload, n, &self.cfg.finder)?;
                    lengths.push(LengthSummary {
                        length: n,
                        free_tokens: missing.len(),
                        ..LengthSummary::default()
                    });

                    if !missing.is_empty() {
                        info!(stamp = %self.ctx.stamp(), length = n, free_tokens = missing.len(), "found free tokens");
                        State::SubstitutePass {
                            length: n,
                            queue: missing.into_queue(),
                        }
                    } else if universe_size(n).map_or(true, |u| u > self.cfg.finder.universe_limit) {
                        // Every longer length has a larger universe.
                        info!(stamp = %self.ctx.stamp(), length = n, "free-token universe over limit; ending sweep");
                        State::Done(RunStop::LengthsExhausted)
                    } else {
                        State::ScanLength(n + 1)
                    }
                }

                State::SubstitutePass { .. } if budget.exhausted() => State::Done(RunStop::BudgetExhausted),
                State::SubstitutePass { length, queue } if queue.is_empty() => {
                    info!(stamp = %self.ctx.stamp(), length, "free tokens exhausted");
                    State::ScanLength(length + 1)
                }
                State::SubstitutePass { length, mut queue } => {
                    let candidates =
                        rank_candidates(&artifact.payload, length, self.cfg.max_length, &self.cfg.scorer)?;

                    let outcome = self.engine.run_pass(
                        &mut artifact.payload,
                        &mut artifact.rules,
                        &mut queue,
                        &candidates,
                        &mut budget,
                    );
                    if let Some(summary) = lengths.last_mut() {
                        summary.passes += 1;
                        summary.commits += outcome.commits as u64;
                    }

                    if outcome.commits == 0 {
                        info!(
                            stamp = %self.ctx.stamp(),
                            length,
                            candidates = candidates.len(),
                            stop = ?outcome.stop,
                            "no valid replacements; moving to the next length"
                        );
                        State::ScanLength(length + 1)
                    } else {
                        let size = artifact.encoded_len();
                        if size < best_size {
                            best_size = size;
                            best_iteration = budget.used();
                        }
                        let pct = format!("{:.3}", ratio(size, initial_size));
                        info!(
                            stamp = %self.ctx.stamp(),
                            iteration = budget.used(),
                            length,
                            commits = outcome.commits,
                            size,
                            ratio = %pct,
                            best_iteration,
                            "pass completed"
                        );

                        since_checkpoint += outcome.commits as u64;
                        if self.cfg.checkpoint_every > 0 && since_checkpoint >= self.cfg.checkpoint_every {
                            sink.persist(artifact)?;
                            checkpoints += 1;
                            since_checkpoint = 0;
                        }

                        if outcome.stop == PassStop::BudgetExhausted {
                            State::Done(RunStop::BudgetExhausted)
                        } else {
                            State::SubstitutePass { length, queue }
                        }
                    }
                }
            };
        };

        sink.persist(artifact)?;
        checkpoints += 1;

        let stats = self.engine.stats;
        let final_size = artifact.encoded_len();
        let pct = format!("{:.3}", ratio(final_size, initial_size));
        info!(
            stamp = %self.ctx.stamp(),
            iterations = budget.used(),
            size = final_size,
            ratio = %pct,
            passes = stats.passes - stats_start.passes,
            discarded = stats.discarded - stats_start.discarded,
            stop = ?stop,
            "compression finished"
        );

        Ok(RunReport {
            iterations_start,
            iterations_end: budget.used(),
            initial_size,
            final_size,
            best_iteration,
            best_size,
            checkpoints,
            passes: stats.passes - stats_start.passes,
            conflicts: stats.conflicts - stats_start.conflicts,
            discarded: stats.discarded - stats_start.discarded,
            lengths,
            stop,
        })
    }
}

fn ratio(size: usize, initial: usize) -> f64 {
    if initial == 0 {
        0.0
    } else {
        size as f64 / initial as f64
    }
}
