// crates/ghostsub-core/src/artifact/format.rs

use crate::error::{GhostError, Result};
use crate::rule::{DictionaryLog, SubstitutionRule};
use crate::token::{SequenceToken, MAX_TOKEN_LEN};

/// Two-byte record that ends the rule list: a zero missing length followed by 0xFF.
pub const TERMINATOR: [u8; 2] = [0x00, 0xFF];

/// Self-describing compressed file: original extension, rule log and payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Artifact {
    /// ASCII, no leading dot; empty when the source had no extension.
    pub extension: String,
    pub rules: DictionaryLog,
    pub payload: Vec<u8>,
}

impl Artifact {
    pub fn new(extension: impl Into<String>, rules: DictionaryLog, payload: Vec<u8>) -> Self {
        Self {
            extension: extension.into(),
            rules,
            payload,
        }
    }

    /// Size of `encode()` output, without building it.
    pub fn encoded_len(&self) -> usize {
        encoded_len(&self.extension, &self.rules, self.payload.len())
    }

    /// Layout (all integer fields are single unsigned bytes):
    /// ext_len
    /// ext_bytes[ext_len]
    /// repeated { missing_len substituted_len missing[missing_len] substituted[substituted_len] }
    /// 0x00 0xFF
    /// payload (rest of file)
    pub fn encode(&self) -> Result<Vec<u8>> {
        let ext = normalize_extension(&self.extension)?;

        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(ext.len() as u8);
        out.extend_from_slice(ext.as_bytes());

        for rule in self.rules.iter() {
            write_rule(&mut out, rule)?;
        }

        out.extend_from_slice(&TERMINATOR);
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut i = 0usize;

        let ext_len = read_u8(bytes, &mut i, "extension length")? as usize;
        let ext_bytes = take(bytes, &mut i, ext_len, "extension")?;
        if !ext_bytes.is_ascii() {
            return Err(GhostError::Format("extension is not ASCII".into()));
        }
        let extension = std::str::from_utf8(ext_bytes)
            .map_err(|e| GhostError::Format(format!("extension: {e}")))?;
        // Artifacts written by older tooling stored the dot.
        let extension = extension.trim_start_matches('.').to_string();

        let mut rules = DictionaryLog::new();
        loop {
            let missing_len = read_u8(bytes, &mut i, "rule header")?;
            let substituted_len = read_u8(bytes, &mut i, "rule header")?;

            if missing_len == TERMINATOR[0] {
                if substituted_len == TERMINATOR[1] {
                    break;
                }
                return Err(GhostError::Format(format!(
                    "zero-length missing token in rule {} (substituted_len={})",
                    rules.len(),
                    substituted_len
                )));
            }
            if substituted_len == 0 {
                return Err(GhostError::Format(format!(
                    "zero-length substituted token in rule {}",
                    rules.len()
                )));
            }

            let missing = take(bytes, &mut i, missing_len as usize, "missing token")?;
            let substituted = take(bytes, &mut i, substituted_len as usize, "substituted token")?;
            rules.push(SubstitutionRule::new(
                SequenceToken::new(missing)?,
                SequenceToken::new(substituted)?,
            ));
        }

        Ok(Self {
            extension,
            rules,
            payload: bytes[i..].to_vec(),
        })
    }
}

pub fn encoded_len(extension: &str, rules: &DictionaryLog, payload_len: usize) -> usize {
    let ext = extension.trim_start_matches('.');
    1 + ext.len() + rules.encoded_len() + TERMINATOR.len() + payload_len
}

fn normalize_extension(ext: &str) -> Result<&str> {
    let ext = ext.trim_start_matches('.');
    if !ext.is_ascii() {
        return Err(GhostError::Validation(format!("extension {ext:?} is not ASCII")));
    }
    if ext.len() > MAX_TOKEN_LEN {
        return Err(GhostError::Validation(format!(
            "extension is {} bytes, limit is {}",
            ext.len(),
            MAX_TOKEN_LEN
        )));
    }
    Ok(ext)
}

fn write_rule(out: &mut Vec<u8>, rule: &SubstitutionRule) -> Result<()> {
    for tok in [&rule.missing, &rule.substituted] {
        if tok.len() > MAX_TOKEN_LEN {
            return Err(GhostError::TokenOverflow { len: tok.len() });
        }
    }
    out.push(rule.missing.len_u8());
    out.push(rule.substituted.len_u8());
    out.extend_from_slice(rule.missing.as_bytes());
    out.extend_from_slice(rule.substituted.as_bytes());
    Ok(())
}

fn read_u8(bytes: &[u8], i: &mut usize, what: &str) -> Result<u8> {
    let v = *bytes
        .get(*i)
        .ok_or_else(|| GhostError::Format(format!("unexpected eof reading {what} at offset {}", *i)))?;
    *i += 1;
    Ok(v)
}

fn take<'a>(bytes: &'a [u8], i: &mut usize, n: usize, what: &str) -> Result<&'a [u8]> {
    if bytes.len() < *i + n {
        return Err(GhostError::Format(format!(
            "unexpected eof reading {what}: need {n} bytes at offset {}, have {}",
            *i,
            bytes.len() - *i
        )));
    }
    let s = &bytes[*i..*i + n];
    *i += n;
    Ok(s)
}
