// crates/ghostsub-core/tests/artifact_roundtrip.rs

use ghostsub_core::artifact::format::TERMINATOR;
use ghostsub_core::decompress::restore;
use ghostsub_core::{Artifact, DictionaryLog, GhostError, SequenceToken, SubstitutionRule};

fn tok(b: &[u8]) -> SequenceToken {
    SequenceToken::new(b).expect("token")
}

fn rule(m: &[u8], s: &[u8]) -> SubstitutionRule {
    SubstitutionRule::new(tok(m), tok(s))
}

#[test]
fn empty_log_roundtrip() {
    let a = Artifact::new("txt", DictionaryLog::new(), b"payload bytes".to_vec());
    let enc = a.encode().expect("encode");
    assert_eq!(&enc[..4], b"\x03txt");
    assert_eq!(&enc[4..6], &TERMINATOR);
    assert_eq!(enc.len(), a.encoded_len());
    assert_eq!(Artifact::decode(&enc).expect("decode"), a);
}

#[test]
fn single_rule_roundtrip_with_extreme_lengths() {
    let long: Vec<u8> = (0..255u32).map(|i| (i * 7) as u8).collect();
    let log = DictionaryLog::from(vec![rule(&[0x00], &long)]);
    let a = Artifact::new("", log, vec![0x00, 0x00, 0x41]);
    let enc = a.encode().expect("encode");
    assert_eq!(enc[0], 0);
    assert_eq!(enc[1], 1);
    assert_eq!(enc[2], 255);
    assert_eq!(Artifact::decode(&enc).expect("decode"), a);
}

#[test]
fn many_rules_roundtrip() {
    let mut rules = Vec::new();
    for i in 0..300u32 {
        let m = [(i % 256) as u8, (i / 256) as u8];
        let s: Vec<u8> = (0..(3 + i % 40)).map(|j| (i + j) as u8).collect();
        rules.push(rule(&m, &s));
    }
    let a = Artifact::new("tar", DictionaryLog::from(rules), (0..=255u8).collect());
    let enc = a.encode().expect("encode");
    let dec = Artifact::decode(&enc).expect("decode");
    assert_eq!(dec.rules.len(), 300);
    assert_eq!(dec, a);
}

#[test]
fn zero_rule_artifact_decompresses_to_payload() {
    let mut bytes = vec![3u8];
    bytes.extend_from_slice(b"bin");
    bytes.extend_from_slice(&[0x00, 0xFF]);
    bytes.extend_from_slice(b"\x00\xFFraw payload\x00\xFF");

    let a = Artifact::decode(&bytes).expect("decode");
    assert_eq!(a.extension, "bin");
    assert!(a.rules.is_empty());
    assert_eq!(restore(&a), b"\x00\xFFraw payload\x00\xFF");
}

#[test]
fn payload_may_be_empty() {
    let a = Artifact::decode(&[0x00, 0x00, 0xFF]).expect("decode");
    assert!(a.payload.is_empty());
    assert_eq!(a.extension, "");
}

#[test]
fn legacy_dotted_extension_is_trimmed() {
    let a = Artifact::decode(b"\x04.txt\x00\xFFhi").expect("decode");
    assert_eq!(a.extension, "txt");
    assert_eq!(a.payload, b"hi");
}

#[test]
fn truncated_artifacts_are_rejected() {
    let log = DictionaryLog::from(vec![rule(b"\x01", b"hello"), rule(b"\x02", b"world")]);
    let enc = Artifact::new("md", log, b"xyz".to_vec()).encode().expect("encode");
    // Every strict prefix that cuts before the terminator is malformed.
    let term_at = 3 + (2 + 1 + 5) * 2;
    assert_eq!(&enc[term_at..term_at + 2], &TERMINATOR);
    for cut in 0..term_at + 2 {
        let err = Artifact::decode(&enc[..cut]).unwrap_err();
        assert!(matches!(err, GhostError::Format(_)), "cut={cut} err={err:?}");
    }
    assert!(Artifact::decode(&enc[..term_at + 2]).is_ok());
}

#[test]
fn malformed_records_are_rejected() {
    // zero missing length that is not the terminator
    assert!(matches!(
        Artifact::decode(b"\x00\x00\x05abcde"),
        Err(GhostError::Format(_))
    ));
    // zero substituted length
    assert!(matches!(
        Artifact::decode(b"\x00\x01\x00a\x00\xFF"),
        Err(GhostError::Format(_))
    ));
    // extension past eof
    assert!(matches!(Artifact::decode(b"\x09ab"), Err(GhostError::Format(_))));
    // non-ASCII extension
    assert!(matches!(
        Artifact::decode(b"\x02\xC3\xA9\x00\xFF"),
        Err(GhostError::Format(_))
    ));
}

#[test]
fn oversized_inputs_are_rejected_before_writing() {
    assert!(matches!(
        SequenceToken::new(&vec![1u8; 256]),
        Err(GhostError::TokenOverflow { len: 256 })
    ));
    assert!(matches!(
        SequenceToken::try_from(vec![1u8; 300]),
        Err(GhostError::TokenOverflow { len: 300 })
    ));
    let a = Artifact::new("x".repeat(256), DictionaryLog::new(), Vec::new());
    assert!(matches!(a.encode(), Err(GhostError::Validation(_))));
}
