// crates/ghostsub-cli/src/cmd/decompress.rs

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ghostsub_core::decompress::restore;
use tracing::info;

use crate::io::artifact_file;

#[derive(Args, Debug)]
pub struct DecompressArgs {
    /// Input .boo artifact
    pub path: PathBuf,

    /// Output path (default: deco_<name>.<original extension> next to the artifact)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: DecompressArgs) -> anyhow::Result<()> {
    let artifact = artifact_file::read_artifact(&args.path)?;
    let out = args
        .out
        .clone()
        .unwrap_or_else(|| artifact_file::decompressed_path_for(&args.path, &artifact.extension));

    let plain = restore(&artifact);
    std::fs::write(&out, &plain).with_context(|| format!("write {}", out.display()))?;

    info!(
        artifact = %args.path.display(),
        out = %out.display(),
        rules = artifact.rules.len(),
        payload_bytes = artifact.payload.len(),
        out_bytes = plain.len(),
        "decompress ok"
    );
    Ok(())
}
