//! `Verifier` — independently recomputes `f1..f7` from a 64-element proof
//! and checks the result against a challenge, without touching the plot file.

use crate::aes_hash::{F1, Fx};
use crate::collate;
use crate::error::{PlotError, Result};
use crate::matcher::Matcher;
use crate::params::{top_k_bits, truncate_k};

/// Replays the forward-propagation pipeline over a candidate proof.
pub struct Verifier {
    f1: F1,
    fx: Fx,
    matcher: Matcher,
}

impl Verifier {
    /// Build a verifier over the given 32-byte plot seed.
    pub fn new(seed: &[u8; 32]) -> Self {
        Self {
            f1: F1::new(seed),
            fx: Fx::new(seed),
            matcher: Matcher::new(),
        }
    }

    /// Verify `proof` answers `challenge` under space parameter `k`.
    pub fn verify(&self, challenge: &[u8; 32], k: u32, proof: &[u64; 64]) -> Result<()> {
        let mut fxs: Vec<u64> = proof.iter().map(|&x| self.f1.eval(x, k)).collect();
        let mut metas: Vec<u128> = proof.iter().map(|&x| u128::from(x)).collect();

        for t in 2..=7u8 {
            let mut next_fxs = Vec::with_capacity(fxs.len() / 2);
            let mut next_metas = Vec::with_capacity(fxs.len() / 2);

            for pair in 0..fxs.len() / 2 {
                let (lfx, rfx) = (fxs[2 * pair], fxs[2 * pair + 1]);
                if !self.matcher.is_match(lfx, rfx) {
                    return Err(PlotError::InvalidProof(format!(
                        "no match at table {t}, pair {pair}"
                    )));
                }
                let (meta_l, meta_r) = (metas[2 * pair], metas[2 * pair + 1]);
                let (fx_next, collated) = collate::evaluate(&self.fx, t, k, lfx, meta_l, meta_r);
                next_fxs.push(fx_next);
                next_metas.push(collated);
            }

            fxs = next_fxs;
            metas = next_metas;
        }

        debug_assert_eq!(fxs.len(), 1);
        if truncate_k(fxs[0], k) != top_k_bits(challenge, k) {
            return Err(PlotError::InvalidProof(
                "final f-value does not match challenge".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;
    use crate::propagator::ForwardPropagator;
    use crate::storage::MemoryStorage;

    #[test]
    fn proof_from_a_freshly_built_plot_verifies() {
        let storage = MemoryStorage::new();
        let seed = [9u8; 32];
        let k = 18;

        let propagator = ForwardPropagator::new(&storage, seed, k, 64 * 1024 * 1024);
        let mut header = Header::new(seed, k).unwrap();
        header.write(&storage).unwrap();
        propagator.write_t1(&mut header).unwrap();
        for t in 2..=7u8 {
            propagator.propagate_table(t, &mut header).unwrap();
        }
        crate::checkpoint::Checkpoint::build(&storage, k, &mut header).unwrap();

        let prover = crate::prove::Prover::open(&storage).unwrap();
        let challenge = {
            let mut c = [0u8; 32];
            c[0] = 0xAB;
            c
        };

        let mut found = None;
        for i in 0..256u16 {
            let mut c = challenge;
            c[31] ^= i as u8;
            if let Ok(proof) = prover.prove(&c) {
                found = Some((c, proof));
                break;
            }
        }

        let (challenge, proof) = found.expect("at least one of 256 adjacent challenges succeeds");
        let verifier = Verifier::new(&seed);
        assert!(verifier.verify(&challenge, k, &proof).is_ok());

        let mut bad_proof = proof;
        bad_proof[0] ^= 1;
        assert!(verifier.verify(&challenge, k, &bad_proof).is_err());
    }
}
