//! Stress test: key generation from many threads at once.
//!
//! `SignetKeyPair::generate` has no shared mutable state and must be safe
//! to call concurrently; every generated key must be distinct.

use std::collections::HashSet;
use std::thread;

use signet::SignetKeyPair;

#[test]
fn stress_concurrent_keygen_unique_keys() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            thread::spawn(|| {
                (0..100)
                    .map(|_| SignetKeyPair::generate().public_key_text())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for key in handle.join().expect("keygen thread panicked") {
            assert!(key.ends_with('='));
            assert!(seen.insert(key), "duplicate key generated");
        }
    }
    assert_eq!(seen.len(), 800);
}

#[test]
fn stress_concurrent_import_roundtrip() {
    let exported: Vec<_> = (0..4)
        .map(|_| SignetKeyPair::generate().export_keys())
        .collect();

    let handles: Vec<_> = exported
        .into_iter()
        .map(|(pub_text, priv_text)| {
            thread::spawn(move || {
                for _ in 0..250 {
                    let kp = SignetKeyPair::import(&pub_text, &priv_text)
                        .expect("import should succeed");
                    assert_eq!(kp.public_key_text(), pub_text);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("import thread panicked");
    }
}
