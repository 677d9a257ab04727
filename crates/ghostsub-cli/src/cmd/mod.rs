// crates/ghostsub-cli/src/cmd/mod.rs

pub mod compress;
pub mod decompress;
pub mod inspect;
