// crates/ghostsub-core/src/replace.rs

//! Byte-string search and replacement shared by compression and decompression.
//!
//! `replace_all` is leftmost, non-overlapping, left-to-right: after a match
//! the scan resumes just past the matched bytes. Both directions of every rule
//! go through this one function, so the round-trip check in the engine tests
//! exactly what decompression will later do.

/// Offset of the first occurrence of `needle` in `hay`.
fn find(hay: &[u8], needle: &[u8]) -> Option<usize> {
    find_from(hay, needle, 0)
}

pub fn contains(hay: &[u8], needle: &[u8]) -> bool {
    find(hay, needle).is_some()
}

fn find_from(hay: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    let n = needle.len();
    if n == 0 || hay.len() < n || from > hay.len() - n {
        return None;
    }
    let first = needle[0];
    let last_start = hay.len() - n;
    let mut i = from;
    while i <= last_start {
        // Skip to the next candidate first byte.
        match hay[i..=last_start].iter().position(|&b| b == first) {
            Some(off) => i += off,
            None => return None,
        }
        if &hay[i..i + n] == needle {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Replace every non-overlapping occurrence of `from` with `to`.
///
/// An empty `from` matches nothing and returns a copy of `hay`.
pub fn replace_all(hay: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(hay.len());
    let mut pos = 0usize;
    while let Some(at) = find_from(hay, from, pos) {
        out.extend_from_slice(&hay[pos..at]);
        out.extend_from_slice(to);
        pos = at + from.len();
    }
    out.extend_from_slice(&hay[pos..]);
    out
}
