//! Deterministic mask generation.
//!
//! This module exposes the byte expansion primitive underneath challenge
//! derivation: the MGF1 construction, which stretches a short seed into an
//! arbitrarily long stream by hashing the seed together with a 4-byte
//! big-endian block counter.  Prover and verifier run the expansion
//! independently and must agree bit for bit, so determinism here is a
//! correctness contract rather than an implementation detail.
//!
//! The generator is parameterised over the backing digest.  BLAKE2b-256 is
//! the default used throughout the crate; SHA-256 and SHA3-256 aliases are
//! provided for deployments that standardise on those hashes.

use std::cmp::min;
use std::fmt;
use std::marker::PhantomData;

use blake2::digest::{consts::U32, Digest};

use crate::error::ProofError;

/// BLAKE2b with a 256-bit output, the crate's default mask digest.
pub type Blake2b256 = blake2::Blake2b<U32>;

/// Mask generator backed by BLAKE2b-256.
pub type Blake2bMaskGenerator = MaskGenerator<Blake2b256>;

/// Mask generator backed by SHA-256.
pub type Sha256MaskGenerator = MaskGenerator<sha2::Sha256>;

/// Mask generator backed by SHA3-256.
pub type Sha3MaskGenerator = MaskGenerator<sha3::Sha3_256>;

/// Deterministic MGF1 byte stream generator over a fixed seed.
///
/// Every call is a pure function of `(seed, counter_start, length)`: block
/// `i` of the stream is `D(seed || BE32(i))` and the final block is
/// truncated to the requested length.
pub struct MaskGenerator<D: Digest> {
    seed: Vec<u8>,
    _digest: PhantomData<D>,
}

impl<D: Digest> MaskGenerator<D> {
    /// Creates a generator over the given seed bytes.
    pub fn new(seed: impl Into<Vec<u8>>) -> Self {
        Self {
            seed: seed.into(),
            _digest: PhantomData,
        }
    }

    /// Returns the seed this generator expands.
    pub fn seed(&self) -> &[u8] {
        &self.seed
    }

    /// Output size in bytes of the backing digest.
    pub fn digest_size() -> usize {
        <D as Digest>::output_size()
    }

    /// Expands the seed into exactly `length` bytes, starting at block
    /// `counter_start`.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::InvalidArgument`] if the request would run the
    /// 4-byte block counter past its range.
    pub fn generate(&self, counter_start: u32, length: usize) -> Result<Vec<u8>, ProofError> {
        let mut out = vec![0u8; length];
        self.fill(counter_start, &mut out)?;
        Ok(out)
    }

    /// Expands the seed into the caller's buffer, starting at block
    /// `counter_start`.  The buffer length is the request: the whole of
    /// `out` is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::InvalidArgument`] if the request would run the
    /// 4-byte block counter past its range.
    pub fn fill(&self, counter_start: u32, out: &mut [u8]) -> Result<(), ProofError> {
        if out.is_empty() {
            return Ok(());
        }
        let block_len = Self::digest_size();
        let blocks = (out.len() + block_len - 1) / block_len;
        let last_block = counter_start as u64 + blocks as u64 - 1;
        if last_block > u64::from(u32::MAX) {
            return Err(ProofError::InvalidArgument(format!(
                "mask request of {} bytes from counter {counter_start} exhausts the block counter",
                out.len()
            )));
        }
        let mut offset = 0;
        for i in 0..blocks as u32 {
            let mut hasher = D::new();
            hasher.update(&self.seed);
            hasher.update((counter_start + i).to_be_bytes());
            let block = hasher.finalize();
            let take = min(block_len, out.len() - offset);
            out[offset..offset + take].copy_from_slice(&block[..take]);
            offset += take;
        }
        Ok(())
    }
}

impl<D: Digest> Clone for MaskGenerator<D> {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed.clone(),
            _digest: PhantomData,
        }
    }
}

impl<D: Digest> fmt::Debug for MaskGenerator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaskGenerator")
            .field("seed_len", &self.seed.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Blake2bMaskGenerator, MaskGenerator, Sha256MaskGenerator, Sha3MaskGenerator};

    #[test]
    fn test_blake2b_known_answer() {
        let mask = Blake2bMaskGenerator::new(b"redstoneredstone".to_vec());
        let out = mask.generate(0, 64).unwrap();
        assert_eq!(
            hex::encode(out),
            "78348ca3740570accf09811df4d037edfff5be3a5b48f327776e36f93c1b122c\
             06497a95618f5d84219d225c68f7297606f7c352b37658cf7f443894dfa3f999"
        );
    }

    #[test]
    fn test_counter_start_continues_the_stream() {
        let mask = Blake2bMaskGenerator::new(b"redstoneredstone".to_vec());
        let long = mask.generate(0, 64).unwrap();
        let tail = mask.generate(1, 32).unwrap();
        assert_eq!(long[32..], tail[..]);
        assert_eq!(
            hex::encode(&tail),
            "06497a95618f5d84219d225c68f7297606f7c352b37658cf7f443894dfa3f999"
        );
    }

    #[test]
    fn test_truncates_final_block() {
        let mask = Blake2bMaskGenerator::new(b"abc".to_vec());
        assert_eq!(hex::encode(mask.generate(0, 5).unwrap()), "704a876525");
        assert_eq!(hex::encode(mask.generate(5, 7).unwrap()), "890d2cc1cfdc2f");
    }

    #[test]
    fn test_sha256_known_answer() {
        // Standard MGF1-SHA256 vector for the empty seed.
        let mask = Sha256MaskGenerator::new(Vec::new());
        let out = mask.generate(0, 40).unwrap();
        assert_eq!(
            hex::encode(out),
            "df3f619804a92fdb4057192dc43dd748ea778adc52bc498ce80524c014b81119b40711a88c703975"
        );
    }

    #[test]
    fn test_sha3_known_answer() {
        let mask = Sha3MaskGenerator::new(b"abc".to_vec());
        let out = mask.generate(0, 34).unwrap();
        assert_eq!(
            hex::encode(out),
            "b7bb0c0c5ceeb0d1824799ab6ad0392c45359177dd78c76c22e491d0c4c7624846cb"
        );
    }

    #[test]
    fn test_zero_length_request() {
        let mask = Blake2bMaskGenerator::new(b"seed".to_vec());
        assert!(mask.generate(0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_fill_matches_generate() {
        let mask = Blake2bMaskGenerator::new(b"seed".to_vec());
        let mut buf = [0u8; 77];
        mask.fill(3, &mut buf).unwrap();
        assert_eq!(buf.to_vec(), mask.generate(3, 77).unwrap());
    }

    #[test]
    fn test_counter_exhaustion_is_rejected() {
        let mask = Blake2bMaskGenerator::new(b"seed".to_vec());
        let hlen = MaskGenerator::<super::Blake2b256>::digest_size();
        assert!(mask.generate(u32::MAX, hlen + 1).is_err());
        // The last representable block is still usable.
        assert_eq!(mask.generate(u32::MAX, hlen).unwrap().len(), hlen);
    }

    proptest! {
        #[test]
        fn prop_generation_is_deterministic(seed in proptest::collection::vec(any::<u8>(), 0..64),
                                            len in 0usize..512) {
            let mask = Blake2bMaskGenerator::new(seed);
            prop_assert_eq!(mask.generate(0, len).unwrap(), mask.generate(0, len).unwrap());
        }

        #[test]
        fn prop_shorter_requests_are_prefixes(seed in proptest::collection::vec(any::<u8>(), 0..64),
                                              short in 0usize..256,
                                              extra in 0usize..256) {
            let mask = Blake2bMaskGenerator::new(seed);
            let long = mask.generate(0, short + extra).unwrap();
            let shorter = mask.generate(0, short).unwrap();
            prop_assert_eq!(&long[..short], &shorter[..]);
        }
    }
}
