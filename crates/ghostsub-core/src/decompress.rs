// crates/ghostsub-core/src/decompress.rs

use crate::artifact::format::Artifact;
use crate::replace::replace_all;
use crate::rule::DictionaryLog;

/// Undo every rule, last committed first. No validation happens here:
/// exactness rests on the round-trip check made when each rule was committed.
pub fn replay_reverse(payload: &[u8], log: &DictionaryLog) -> Vec<u8> {
    let mut buf = payload.to_vec();
    for rule in log.iter_reverse() {
        buf = replace_all(&buf, rule.missing.as_bytes(), rule.substituted.as_bytes());
    }
    buf
}

/// Apply every rule in commit order; reproduces the payload from the original bytes.
pub fn replay_forward(original: &[u8], log: &DictionaryLog) -> Vec<u8> {
    let mut buf = original.to_vec();
    for rule in log.iter() {
        buf = replace_all(&buf, rule.substituted.as_bytes(), rule.missing.as_bytes());
    }
    buf
}

pub fn restore(artifact: &Artifact) -> Vec<u8> {
    replay_reverse(&artifact.payload, &artifact.rules)
}
