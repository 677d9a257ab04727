pub mod error;

pub mod artifact;
pub mod decompress;
pub mod driver;
pub mod engine;
pub mod replace;
pub mod rule;
pub mod scan;
pub mod token;

pub use crate::artifact::format::Artifact;
pub use crate::driver::{CompressConfig, CompressionDriver, RunContext, RunReport};
pub use crate::error::{GhostError, Result};
pub use crate::rule::{DictionaryLog, SubstitutionRule};
pub use crate::token::SequenceToken;
