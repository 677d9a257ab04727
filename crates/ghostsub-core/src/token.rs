// crates/ghostsub-core/src/token.rs

use std::fmt;

use crate::artifact::checksum::hex;
use crate::error::{GhostError, Result};

/// Longest token a rule record can carry (one length byte).
pub const MAX_TOKEN_LEN: usize = 255;

/// Immutable byte sequence of length 1..=255.
///
/// Construction is the only place the length bound is checked, so every
/// `SequenceToken` in a rule log can be written without truncation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceToken(Box<[u8]>);

impl SequenceToken {
    pub fn new(bytes: &[u8]) -> Result<Self> {
        check_len(bytes.len())?;
        Ok(Self(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes; always in 1..=255, so it fits the record's length byte.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len_u8(&self) -> u8 {
        self.0.len() as u8
    }

}

fn check_len(len: usize) -> Result<()> {
    if len == 0 {
        return Err(GhostError::Validation("token must not be empty".into()));
    }
    if len > MAX_TOKEN_LEN {
        return Err(GhostError::TokenOverflow { len });
    }
    Ok(())
}

impl AsRef<[u8]> for SequenceToken {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for SequenceToken {
    type Error = GhostError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes)
    }
}

impl TryFrom<Vec<u8>> for SequenceToken {
    type Error = GhostError;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        check_len(bytes.len())?;
        Ok(Self(bytes.into_boxed_slice()))
    }
}

impl fmt::Debug for SequenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceToken({})", hex(&self.0))
    }
}

/// Set of byte values, used for the per-pass conflict bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ByteSet([u64; 4]);

impl ByteSet {
    pub fn new() -> Self {
        Self([0; 4])
    }

    pub fn insert(&mut self, b: u8) {
        self.0[(b >> 6) as usize] |= 1u64 << (b & 63);
    }

    pub fn contains(&self, b: u8) -> bool {
        self.0[(b >> 6) as usize] & (1u64 << (b & 63)) != 0
    }

    pub fn insert_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.insert(b);
        }
    }

    pub fn intersects(&self, bytes: &[u8]) -> bool {
        bytes.iter().any(|&b| self.contains(b))
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(matches!(
            SequenceToken::new(&[]),
            Err(GhostError::Validation(_))
        ));
        assert!(matches!(
            SequenceToken::new(&[0u8; 256]),
            Err(GhostError::TokenOverflow { len: 256 })
        ));
        assert_eq!(SequenceToken::new(&[7u8; 255]).unwrap().len(), 255);
    }

    #[test]
    fn orders_lexicographically() {
        let a = SequenceToken::new(&[0x00, 0xFF]).unwrap();
        let b = SequenceToken::new(&[0x01, 0x00]).unwrap();
        assert!(a < b);
        assert_eq!(format!("{a:?}"), "SequenceToken(00ff)");
    }

    #[test]
    fn vec_conversion_validates_like_new() {
        assert!(matches!(
            SequenceToken::try_from(Vec::new()),
            Err(GhostError::Validation(_))
        ));
        assert!(matches!(
            SequenceToken::try_from(vec![1u8; 300]),
            Err(GhostError::TokenOverflow { len: 300 })
        ));
        let t = SequenceToken::try_from(b"ab".to_vec()).unwrap();
        assert_eq!(t, SequenceToken::new(b"ab").unwrap());
    }

    #[test]
    fn byteset_tracks_membership() {
        let mut s = ByteSet::new();
        assert!(s.is_empty());
        s.insert_all(b"ABCA");
        assert_eq!(s.len(), 3);
        assert!(s.contains(b'C'));
        assert!(!s.contains(0xFF));
        s.insert(0xFF);
        assert!(s.intersects(&[0x10, 0xFF]));
        assert!(!s.intersects(b"xyz"));
    }
}
