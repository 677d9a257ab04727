// crates/ghostsub-core/tests/invariants.rs

use ghostsub_core::decompress::{replay_forward, replay_reverse};
use ghostsub_core::replace::{contains, replace_all};
use ghostsub_core::scan::scorer::{CountBackend, ScorerConfig};
use ghostsub_core::{Artifact, CompressConfig, CompressionDriver, DictionaryLog, Result, RunContext};

fn lcg_next(x: &mut u64) -> u64 {
    *x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
    *x
}

/// Text-like input: words from a tiny vocabulary plus some noise bytes.
fn corpus(seed: u64, words: usize) -> Vec<u8> {
    const VOCAB: [&[u8]; 8] = [b"the ", b"of ", b"ghost ", b"token ", b"\n", b"sub", b"stitution ", b"0x"];
    let mut s = seed;
    let mut out = Vec::new();
    for _ in 0..words {
        let r = lcg_next(&mut s);
        out.extend_from_slice(VOCAB[(r >> 61) as usize]);
        if (r >> 40) & 0x1F == 0 {
            out.push((r >> 48) as u8);
        }
    }
    out
}

fn run(input: &[u8], iterations: Option<u64>, max_length: usize, backend: CountBackend) -> Artifact {
    let cfg = CompressConfig {
        iterations,
        max_length,
        checkpoint_every: 0,
        scorer: ScorerConfig {
            backend,
            ..ScorerConfig::default()
        },
        ..CompressConfig::default()
    };
    let mut artifact = Artifact::new("txt", DictionaryLog::new(), input.to_vec());
    let mut sink = |_: &Artifact| -> Result<()> { Ok(()) };
    CompressionDriver::new(cfg, RunContext::new())
        .unwrap()
        .run(&mut artifact, &mut sink)
        .unwrap();
    artifact
}

#[test]
fn roundtrip_law_over_budgets_and_lengths() {
    for seed in [1u64, 2, 3] {
        let input = corpus(seed, 400);
        for &(iterations, max_length) in &[
            (Some(0u64), 4usize),
            (Some(1), 2),
            (Some(5), 9),
            (None, 3),
            (None, 12),
        ] {
            for backend in [CountBackend::Packed, CountBackend::Windows] {
                let a = run(&input, iterations, max_length, backend);
                if let Some(limit) = iterations {
                    assert!(a.rules.len() as u64 <= limit);
                }
                let decoded = Artifact::decode(&a.encode().unwrap()).unwrap();
                assert_eq!(
                    replay_reverse(&decoded.payload, &decoded.rules),
                    input,
                    "seed={seed} it={iterations:?} max={max_length} backend={backend:?}"
                );
                assert_eq!(replay_forward(&input, &a.rules), a.payload);
            }
        }
    }
}

#[test]
fn every_rule_is_safe_and_fresh_at_commit_time() {
    let input = corpus(42, 600);
    let a = run(&input, None, 10, CountBackend::Packed);
    assert!(!a.rules.is_empty());

    let mut buf = input.clone();
    for (k, rule) in a.rules.iter().enumerate() {
        let m = rule.missing.as_bytes();
        let c = rule.substituted.as_bytes();
        assert!(!contains(&buf, m), "rule {k}: missing token present before commit");
        assert!(c.len() > m.len(), "rule {k}: substitution does not shrink");
        let next = replace_all(&buf, c, m);
        assert_eq!(replace_all(&next, m, c), buf, "rule {k}: not reversible");
        buf = next;
    }
    assert_eq!(buf, a.payload);
}

#[test]
fn resumed_run_never_rewrites_existing_rules() {
    let input = corpus(7, 300);
    let first = run(&input, Some(4), 8, CountBackend::Packed);

    let mut resumed = first.clone();
    let cfg = CompressConfig {
        iterations: Some(10),
        max_length: 8,
        ..CompressConfig::default()
    };
    let mut sink = |_: &Artifact| -> Result<()> { Ok(()) };
    CompressionDriver::new(cfg, RunContext::new())
        .unwrap()
        .run(&mut resumed, &mut sink)
        .unwrap();

    assert!(resumed.rules.len() >= first.rules.len());
    assert_eq!(&resumed.rules.rules()[..first.rules.len()], first.rules.rules());
    assert_eq!(replay_reverse(&resumed.payload, &resumed.rules), input);
}
