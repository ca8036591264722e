//! Prove-then-verify and invalid-proof-detection properties from §8.

use ab_pos_plot::{FileStorage, Plotter, Prover, Verifier};
use sha2::{Digest, Sha256};

const K: u32 = 18;
const MEMORY_BUDGET: u64 = 64 * 1024 * 1024;

fn sha256_challenge(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hasher.finalize().into()
}

#[test]
fn a_successful_proof_verifies_and_a_tampered_one_does_not() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let seed = [0u8; 32];

    let storage = FileStorage::open(file.path()).unwrap();
    let plotter = Plotter::new(seed, K, MEMORY_BUDGET).unwrap();
    plotter.run(&storage, false, None).unwrap();

    let prover = Prover::open(&storage).unwrap();
    let base_challenge = sha256_challenge(b"hello");

    let mut found = None;
    for i in 0..256u16 {
        let mut challenge = base_challenge;
        challenge[31] = challenge[31].wrapping_add(i as u8);
        if let Ok(proof) = prover.prove(&challenge) {
            found = Some((challenge, proof));
            break;
        }
    }

    let (challenge, proof) =
        found.expect("at least one of 256 adjacent challenges has a proof for this seed");

    let verifier = Verifier::new(&seed);
    assert!(verifier.verify(&challenge, K, &proof).is_ok());

    let mut tampered = proof;
    tampered[0] ^= 1;
    assert!(verifier.verify(&challenge, K, &tampered).is_err());
}
