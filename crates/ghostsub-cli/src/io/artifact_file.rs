// crates/ghostsub-cli/src/io/artifact_file.rs

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ghostsub_core::artifact::checksum::fingerprint_hex;
use ghostsub_core::decompress::restore;
use ghostsub_core::driver::CheckpointSink;
use ghostsub_core::Artifact;
use tempfile::NamedTempFile;
use tracing::info;

/// Extension given to compressed artifacts.
pub const ARTIFACT_EXT: &str = "boo";

pub fn is_artifact_path(path: &Path) -> bool {
    path.extension().map_or(false, |e| e == ARTIFACT_EXT)
}

/// `dir/name.txt` -> `dir/name.boo`
pub fn artifact_path_for(input: &Path) -> PathBuf {
    input.with_extension(ARTIFACT_EXT)
}

/// Extension recorded in the artifact: no leading dot, empty when absent.
pub fn source_extension(input: &Path) -> anyhow::Result<String> {
    match input.extension() {
        None => Ok(String::new()),
        Some(ext) => {
            let ext = ext
                .to_str()
                .filter(|e| e.is_ascii())
                .with_context(|| format!("extension of {} is not ASCII", input.display()))?;
            Ok(ext.to_string())
        }
    }
}

/// `dir/name.boo` + `txt` -> `dir/deco_name.txt`
pub fn decompressed_path_for(artifact: &Path, extension: &str) -> PathBuf {
    let stem = artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = if extension.is_empty() {
        format!("deco_{stem}")
    } else {
        format!("deco_{stem}.{extension}")
    };
    artifact.with_file_name(name)
}

pub fn read_artifact(path: &Path) -> anyhow::Result<Artifact> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let artifact =
        Artifact::decode(&bytes).with_context(|| format!("decode artifact {}", path.display()))?;
    Ok(artifact)
}

/// Write via a temp file in the same directory, then rename over `path`,
/// so an interrupted write leaves the previous checkpoint intact.
pub fn write_artifact_atomic(path: &Path, artifact: &Artifact) -> ghostsub_core::Result<()> {
    let bytes = artifact.encode()?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Re-read the artifact at `path`, restore it, and check the result has the
/// `expected` fingerprint. Returns the fingerprint on success.
pub fn verify_restores_to(path: &Path, expected: &str) -> anyhow::Result<String> {
    let written = read_artifact(path)?;
    let got = fingerprint_hex(&restore(&written));
    if got != expected {
        anyhow::bail!(
            "verify failed: {} restores to fingerprint {got}, source fingerprint {expected}",
            path.display()
        );
    }
    Ok(got)
}

/// Checkpoint sink that replaces the artifact file on every persist.
pub struct FileCheckpoint {
    path: PathBuf,
    pub writes: u64,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CheckpointSink for FileCheckpoint {
    fn persist(&mut self, artifact: &Artifact) -> ghostsub_core::Result<()> {
        write_artifact_atomic(&self.path, artifact)?;
        self.writes += 1;
        info!(
            path = %self.path.display(),
            rules = artifact.rules.len(),
            bytes = artifact.encoded_len(),
            "checkpoint written"
        );
        Ok(())
    }
}
