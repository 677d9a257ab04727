// crates/ghostsub-cli/src/cmd/compress.rs

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use ghostsub_core::artifact::checksum::fingerprint_hex;
use ghostsub_core::decompress::restore;
use ghostsub_core::scan::default_workers;
use ghostsub_core::scan::missing::{FinderConfig, DEFAULT_MIN_CHUNK, DEFAULT_UNIVERSE_LIMIT};
use ghostsub_core::scan::scorer::{CountBackend, ScorerConfig};
use ghostsub_core::token::MAX_TOKEN_LEN;
use ghostsub_core::{Artifact, CompressConfig, CompressionDriver, DictionaryLog, RunContext};
use tracing::info;

use crate::io::artifact_file::{self, FileCheckpoint};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum Backend {
    /// Group windows by their bytes.
    Windows,
    /// Pack windows of up to 8 bytes into u64 keys (falls back to windows above 8).
    Packed,
}

fn backend_to_core(b: Backend) -> CountBackend {
    match b {
        Backend::Windows => CountBackend::Windows,
        Backend::Packed => CountBackend::Packed,
    }
}

#[derive(Args, Debug)]
pub struct CompressArgs {
    /// File to compress, or a .boo artifact to keep compressing
    pub path: PathBuf,

    /// Stop once the artifact holds this many rules (-1 = no limit)
    #[arg(allow_negative_numbers = true)]
    pub iterations: i64,

    /// Longest sequence considered for replacement (clamped to 1..=255)
    #[arg(allow_negative_numbers = true)]
    pub max_length: i64,

    /// Candidates kept per length and per pass
    #[arg(long, default_value_t = 256)]
    pub top_n: usize,

    /// Rewrite the artifact after this many new rules (0 = only at exit)
    #[arg(long, default_value_t = 100)]
    pub checkpoint_every: u64,

    /// Window counting backend for candidate scoring
    #[arg(long, value_enum, default_value_t = Backend::Packed)]
    pub backend: Backend,

    /// Scan workers (default: one per rayon thread)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Largest free-token universe (256^length) to enumerate
    #[arg(long, default_value_t = DEFAULT_UNIVERSE_LIMIT)]
    pub universe_limit: u64,

    /// Output artifact path (default: input with .boo extension, or the input itself when resuming)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// After the run, check the artifact restores to the starting bytes
    #[arg(long, default_value_t = false)]
    pub verify: bool,
}

pub fn run(args: CompressArgs) -> anyhow::Result<()> {
    let iterations = match args.iterations {
        -1 => None,
        n if n < 0 => anyhow::bail!("iterations must be -1 (unbounded) or >= 0, got {n}"),
        n => Some(n as u64),
    };
    let max_length = args.max_length.clamp(1, MAX_TOKEN_LEN as i64) as usize;

    let resuming = artifact_file::is_artifact_path(&args.path);
    let (mut artifact, default_out) = if resuming {
        let a = artifact_file::read_artifact(&args.path)?;
        info!(
            path = %args.path.display(),
            rules = a.rules.len(),
            payload_bytes = a.payload.len(),
            "resuming artifact"
        );
        (a, args.path.clone())
    } else {
        let data = std::fs::read(&args.path)
            .with_context(|| format!("read {}", args.path.display()))?;
        let ext = artifact_file::source_extension(&args.path)?;
        (
            Artifact::new(ext, DictionaryLog::new(), data),
            artifact_file::artifact_path_for(&args.path),
        )
    };
    let out = args.out.clone().unwrap_or(default_out);

    let workers = args.workers.unwrap_or_else(default_workers).max(1);
    let cfg = CompressConfig {
        iterations,
        max_length,
        checkpoint_every: args.checkpoint_every,
        finder: FinderConfig {
            workers,
            min_chunk: DEFAULT_MIN_CHUNK,
            universe_limit: args.universe_limit,
        },
        scorer: ScorerConfig {
            top_n: args.top_n,
            workers,
            backend: backend_to_core(args.backend),
        },
    };

    let before = args.verify.then(|| fingerprint_hex(&restore(&artifact)));

    info!(
        input = %args.path.display(),
        out = %out.display(),
        iterations = ?iterations,
        max_length,
        top_n = args.top_n,
        backend = ?args.backend,
        workers,
        "compress start"
    );

    let ctx = RunContext::new();
    let mut sink = FileCheckpoint::new(&out);
    let mut driver = CompressionDriver::new(cfg, ctx)?;
    let report = driver
        .run(&mut artifact, &mut sink)
        .with_context(|| format!("compress {}", args.path.display()))?;

    if let Some(before) = before {
        let after = artifact_file::verify_restores_to(sink.path(), &before)?;
        info!(path = %sink.path().display(), fingerprint = %after, "verify ok");
    }

    info!(
        stamp = %ctx.stamp(),
        out = %out.display(),
        rules = artifact.rules.len(),
        new_rules = report.commits(),
        initial_bytes = report.initial_size,
        final_bytes = report.final_size,
        ratio = %format!("{:.3}", report.ratio()),
        best_iteration = report.best_iteration,
        conflicts = report.conflicts,
        checkpoints = sink.writes,
        stop = ?report.stop,
        "compress ok"
    );

    Ok(())
}
