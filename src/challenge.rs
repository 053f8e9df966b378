//! Challenge derivation for the proof protocol.
//!
//! Challenges are integers drawn deterministically from the public seed and
//! the modulus under test.  A domain-separated transcript digest seeds a
//! [`MaskGenerator`] stream, and integers are cut from that stream by
//! rejection sampling: fixed-width big-endian chunks are drawn, the excess
//! high bits of the top byte are masked off, and chunks at or above the
//! bound are discarded.  The accepted values are exactly uniform over
//! `[0, bound)`, so challenge derivation adds no bias term to the soundness
//! error.  Both parties run the identical derivation and obtain the same
//! sequence in the same order.

use std::cmp::min;

use blake2::digest::Digest;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::codec::min_be_bytes;
use crate::error::ProofError;
use crate::mask::{Blake2b256, MaskGenerator};
use crate::setup::ProofSetup;

/// Domain tag for per-round challenge bases.
const BASE_DOMAIN: &[u8] = b"modulus_guard:v1:base";
/// Domain tag for the aggregate binding exponent.
const AGGREGATE_DOMAIN: &[u8] = b"modulus_guard:v1:aggregate";
/// Domain tag for the prover's secret nonce.
const NONCE_DOMAIN: &[u8] = b"modulus_guard:v1:nonce";
/// Domain tag for compositeness witnesses.
const WITNESS_DOMAIN: &[u8] = b"modulus_guard:v1:witness";

/// Hashes a domain tag and a sequence of length-prefixed inputs into a mask
/// seed.  Every variable-length input is preceded by its big-endian 8-byte
/// length so that distinct input splits can never collide.
fn transcript_seed<D: Digest>(
    domain: &[u8],
    public_seed: &[u8],
    modulus: &BigUint,
    extra: &[&BigUint],
) -> Vec<u8> {
    let mut hasher = D::new();
    hasher.update(domain);
    hasher.update((public_seed.len() as u64).to_be_bytes());
    hasher.update(public_seed);
    let modulus_bytes = min_be_bytes(modulus);
    hasher.update((modulus_bytes.len() as u64).to_be_bytes());
    hasher.update(&modulus_bytes);
    for value in extra {
        let bytes = min_be_bytes(value);
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(&bytes);
    }
    hasher.finalize().to_vec()
}

/// Buffered reader over a mask stream, consumed block by block.
struct ChallengeStream<D: Digest> {
    mask: MaskGenerator<D>,
    counter: u32,
    buffer: Vec<u8>,
    offset: usize,
}

impl<D: Digest> ChallengeStream<D> {
    fn new(seed: Vec<u8>) -> Self {
        Self {
            mask: MaskGenerator::new(seed),
            counter: 0,
            buffer: Vec::new(),
            offset: 0,
        }
    }

    /// Takes the next `length` bytes of the stream.
    fn take(&mut self, length: usize) -> Result<Vec<u8>, ProofError> {
        let mut chunk = Vec::with_capacity(length);
        while chunk.len() < length {
            if self.offset >= self.buffer.len() {
                self.buffer = self
                    .mask
                    .generate(self.counter, MaskGenerator::<D>::digest_size())?;
                self.counter = self.counter.checked_add(1).ok_or_else(|| {
                    ProofError::InvalidArgument("mask block counter exhausted".to_string())
                })?;
                self.offset = 0;
            }
            let take = min(length - chunk.len(), self.buffer.len() - self.offset);
            chunk.extend_from_slice(&self.buffer[self.offset..self.offset + take]);
            self.offset += take;
        }
        Ok(chunk)
    }

    /// Draws an integer uniform over `[0, bound)` by rejection sampling.
    fn draw_below(&mut self, bound: &BigUint) -> Result<BigUint, ProofError> {
        if bound.is_zero() {
            return Err(ProofError::InvalidArgument(
                "challenge bound must be positive".to_string(),
            ));
        }
        let bits = bound.bits();
        let width = ((bits + 7) / 8) as usize;
        let excess = (width as u64 * 8 - bits) as u32;
        let top_mask = 0xFFu8 >> excess;
        loop {
            let mut chunk = self.take(width)?;
            chunk[0] &= top_mask;
            let candidate = BigUint::from_bytes_be(&chunk);
            if candidate < *bound {
                return Ok(candidate);
            }
        }
    }
}

/// Derives `count` challenge integers uniform over `[0, bound)`, bound to
/// the setup's public seed and to `modulus`.
///
/// Round order is significant: callers on both sides of the protocol receive
/// the identical sequence for identical inputs.
///
/// # Errors
///
/// Returns [`ProofError::InvalidArgument`] if `count` is zero or `bound` is
/// zero; mask failures propagate.
pub fn derive_challenges(
    setup: &ProofSetup,
    modulus: &BigUint,
    count: usize,
    bound: &BigUint,
) -> Result<Vec<BigUint>, ProofError> {
    derive_challenges_with_digest::<Blake2b256>(setup, modulus, count, bound)
}

/// [`derive_challenges`] over a caller-chosen mask digest.
pub fn derive_challenges_with_digest<D: Digest>(
    setup: &ProofSetup,
    modulus: &BigUint,
    count: usize,
    bound: &BigUint,
) -> Result<Vec<BigUint>, ProofError> {
    if count == 0 {
        return Err(ProofError::InvalidArgument(
            "challenge count must be positive".to_string(),
        ));
    }
    let seed = transcript_seed::<D>(BASE_DOMAIN, setup.public_seed(), modulus, &[]);
    let mut stream = ChallengeStream::<D>::new(seed);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(stream.draw_below(bound)?);
    }
    Ok(out)
}

/// Derives the aggregate binding exponent below `2^security_parameter` from
/// the seed, the modulus and every per-round value in order.
pub(crate) fn derive_aggregate_exponent<D: Digest>(
    setup: &ProofSetup,
    modulus: &BigUint,
    rounds: &[BigUint],
) -> Result<BigUint, ProofError> {
    let refs: Vec<&BigUint> = rounds.iter().collect();
    let seed = transcript_seed::<D>(AGGREGATE_DOMAIN, setup.public_seed(), modulus, &refs);
    let mut stream = ChallengeStream::<D>::new(seed);
    let bound = BigUint::from(1u32) << setup.security_parameter();
    stream.draw_below(&bound)
}

/// Derives the prover's secret nonce uniform over `[0, bound)`.  The secret
/// factors are absorbed into the transcript so the nonce is unpredictable to
/// anyone who cannot already factor the modulus.
pub(crate) fn derive_secret_nonce<D: Digest>(
    setup: &ProofSetup,
    modulus: &BigUint,
    p: &BigUint,
    q: &BigUint,
    bound: &BigUint,
) -> Result<BigUint, ProofError> {
    let seed = transcript_seed::<D>(NONCE_DOMAIN, setup.public_seed(), modulus, &[p, q]);
    let mut stream = ChallengeStream::<D>::new(seed);
    stream.draw_below(bound)
}

/// Derives `count` compositeness witnesses uniform over `[2, modulus - 2]`.
/// The caller must ensure `modulus > 4`.
pub(crate) fn derive_witnesses<D: Digest>(
    setup: &ProofSetup,
    modulus: &BigUint,
    count: usize,
) -> Result<Vec<BigUint>, ProofError> {
    let seed = transcript_seed::<D>(WITNESS_DOMAIN, setup.public_seed(), modulus, &[]);
    let mut stream = ChallengeStream::<D>::new(seed);
    let bound = modulus - 3u32;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(stream.draw_below(&bound)? + 2u32);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;

    use super::{derive_challenges, derive_witnesses};
    use crate::mask::Blake2b256;
    use crate::setup::ProofSetup;

    fn setup() -> ProofSetup {
        ProofSetup::with_parameters(b"redstoneredstone".to_vec(), 512, 16, 40).unwrap()
    }

    fn modulus() -> BigUint {
        BigUint::parse_bytes(b"d94a8bc2f3e0a1b7", 16).unwrap()
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let n = modulus();
        let a = derive_challenges(&setup(), &n, 8, &n).unwrap();
        let b = derive_challenges(&setup(), &n, 8, &n).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_challenges_respect_bound() {
        let n = modulus();
        let bound = BigUint::from(97u32);
        for challenge in derive_challenges(&setup(), &n, 64, &bound).unwrap() {
            assert!(challenge < bound);
        }
    }

    #[test]
    fn test_challenges_bind_the_modulus() {
        let n = modulus();
        let other = &n + 2u32;
        let bound = BigUint::from(1u32) << 64u32;
        let a = derive_challenges(&setup(), &n, 4, &bound).unwrap();
        let b = derive_challenges(&setup(), &other, 4, &bound).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_challenges_bind_the_seed() {
        let n = modulus();
        let other = ProofSetup::with_parameters(b"redstoneredstonf".to_vec(), 512, 16, 40).unwrap();
        let bound = BigUint::from(1u32) << 64u32;
        let a = derive_challenges(&setup(), &n, 4, &bound).unwrap();
        let b = derive_challenges(&other, &n, 4, &bound).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_count_is_rejected() {
        let n = modulus();
        assert!(derive_challenges(&setup(), &n, 0, &n).is_err());
    }

    #[test]
    fn test_zero_bound_is_rejected() {
        let n = modulus();
        let zero = BigUint::from(0u32);
        assert!(derive_challenges(&setup(), &n, 1, &zero).is_err());
    }

    #[test]
    fn test_witnesses_stay_in_range() {
        let n = modulus();
        let two = BigUint::from(2u32);
        let ceiling = &n - 2u32;
        for witness in derive_witnesses::<Blake2b256>(&setup(), &n, 32).unwrap() {
            assert!(witness >= two && witness <= ceiling);
        }
    }
}
