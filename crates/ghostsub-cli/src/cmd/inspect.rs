// crates/ghostsub-cli/src/cmd/inspect.rs

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;

use clap::Args;
use ghostsub_core::artifact::checksum::{blake3_16, crc32, hex};
use ghostsub_core::decompress::restore;

use crate::io::artifact_file;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input .boo artifact
    pub path: PathBuf,

    /// Dump the first N rules as hex
    #[arg(long, default_value_t = 0)]
    pub rules: usize,

    /// Skip replaying the rules (restored size and fingerprint)
    #[arg(long)]
    pub no_restore: bool,

    /// Skip the zstd size scoreboard
    #[arg(long)]
    pub no_zstd: bool,

    /// Zstd compression level (1..=22 typical). Higher is slower.
    #[arg(long, default_value_t = 3)]
    pub zstd_level: i32,
}

pub fn run(args: InspectArgs) -> anyhow::Result<()> {
    let artifact = artifact_file::read_artifact(&args.path)?;
    let encoded = artifact.encode()?;

    let dict_bytes = artifact.rules.encoded_len();
    let mut by_missing_len: BTreeMap<usize, usize> = BTreeMap::new();
    let mut sub_min = usize::MAX;
    let mut sub_max = 0usize;
    let mut sub_total = 0usize;
    for r in artifact.rules.iter() {
        *by_missing_len.entry(r.missing.len()).or_default() += 1;
        sub_min = sub_min.min(r.substituted.len());
        sub_max = sub_max.max(r.substituted.len());
        sub_total += r.substituted.len();
    }

    eprintln!("--- inspect ---");
    eprintln!("file              = {}", args.path.display());
    eprintln!("extension         = {:?}", artifact.extension);
    eprintln!("artifact_bytes    = {}", encoded.len());
    eprintln!("rules             = {}", artifact.rules.len());
    eprintln!("dictionary_bytes  = {}", dict_bytes);
    eprintln!("payload_bytes     = {}", artifact.payload.len());
    eprintln!("payload_crc32     = {:08x}", crc32(&artifact.payload));
    eprintln!("payload_blake3_16 = {}", hex(&blake3_16(&artifact.payload)));

    if !artifact.rules.is_empty() {
        eprintln!("--- rules ---");
        for (len, n) in &by_missing_len {
            eprintln!("missing_len={:<3} count={}", len, n);
        }
        eprintln!(
            "substituted_len   = min={} max={} mean={:.2}",
            sub_min,
            sub_max,
            sub_total as f64 / artifact.rules.len() as f64
        );
    }

    if !args.no_restore {
        let plain = restore(&artifact);
        let ratio = if plain.is_empty() {
            0.0
        } else {
            encoded.len() as f64 / plain.len() as f64
        };
        eprintln!("--- restore ---");
        eprintln!("restored_bytes    = {}", plain.len());
        eprintln!("restored_blake3_16 = {}", hex(&blake3_16(&plain)));
        eprintln!("ratio_artifact/raw = {:.4}", ratio);
    }

    if !args.no_zstd {
        let z = zstd::stream::encode_all(Cursor::new(&encoded), args.zstd_level)?;
        eprintln!("--- zstd ---");
        eprintln!("zstd_level        = {}", args.zstd_level);
        eprintln!("zstd_bytes        = {}", z.len());
    }

    let n = args.rules.min(artifact.rules.len());
    if n > 0 {
        eprintln!("--- first {} rules ---", n);
        for (i, r) in artifact.rules.iter().take(n).enumerate() {
            eprintln!(
                "#{:<5} {} <- {}",
                i,
                hex(r.missing.as_bytes()),
                hex(r.substituted.as_bytes())
            );
        }
    }

    Ok(())
}
