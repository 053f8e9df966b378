//! Immutable protocol configuration.
//!
//! A [`ProofSetup`] captures everything prover and verifier must agree on
//! before a proof is produced: the public seed, the declared modulus size,
//! the number of challenge rounds and the statistical blinding slack.  The
//! record is validated once at construction and never mutated afterwards;
//! clones are independent values with no shared state.

use serde::{Deserialize, Serialize};

use crate::error::ProofError;

/// Default number of challenge rounds, bounding a cheating prover's success
/// probability at `2^-128`.
pub const DEFAULT_SECURITY_PARAMETER: u32 = 128;

/// Default statistical blinding slack, in bits.
pub const DEFAULT_ALPHA: u32 = 40;

/// Smallest accepted blinding slack.
pub const MIN_ALPHA: u32 = 8;

/// Largest accepted blinding slack.
pub const MAX_ALPHA: u32 = 512;

/// Largest accepted modulus size, in bits.
pub const MAX_KEY_SIZE_BITS: u32 = 65_536;

/// Largest accepted number of challenge rounds.
pub const MAX_SECURITY_PARAMETER: u32 = 4_096;

/// Public parameters of a proof instance.
///
/// The seed is expected to come from a source both sides accept as
/// non-malleable after the modulus was fixed, such as a registration beacon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSetup {
    public_seed: Vec<u8>,
    key_size_bits: u32,
    security_parameter: u32,
    alpha: u32,
}

impl ProofSetup {
    /// Creates a setup with the default security parameter and blinding
    /// slack.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::InvalidArgument`] if `key_size_bits` is zero or
    /// above [`MAX_KEY_SIZE_BITS`].
    pub fn new(public_seed: impl Into<Vec<u8>>, key_size_bits: u32) -> Result<Self, ProofError> {
        Self::with_parameters(
            public_seed,
            key_size_bits,
            DEFAULT_SECURITY_PARAMETER,
            DEFAULT_ALPHA,
        )
    }

    /// Creates a setup with explicit round count and blinding slack.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::InvalidArgument`] if any parameter is zero or
    /// outside its documented range.
    pub fn with_parameters(
        public_seed: impl Into<Vec<u8>>,
        key_size_bits: u32,
        security_parameter: u32,
        alpha: u32,
    ) -> Result<Self, ProofError> {
        let setup = Self {
            public_seed: public_seed.into(),
            key_size_bits,
            security_parameter,
            alpha,
        };
        setup.validate()?;
        Ok(setup)
    }

    /// Public seed bytes the challenge derivation is bound to.
    pub fn public_seed(&self) -> &[u8] {
        &self.public_seed
    }

    /// Declared modulus size in bits.
    pub fn key_size_bits(&self) -> u32 {
        self.key_size_bits
    }

    /// Number of challenge rounds.
    pub fn security_parameter(&self) -> u32 {
        self.security_parameter
    }

    /// Statistical blinding slack in bits.
    pub fn alpha(&self) -> u32 {
        self.alpha
    }

    /// Re-checks the construction invariants.
    ///
    /// Deserialized setups bypass the constructors, so the proof engine
    /// revalidates before using a setup.
    pub(crate) fn validate(&self) -> Result<(), ProofError> {
        if self.key_size_bits == 0 || self.key_size_bits > MAX_KEY_SIZE_BITS {
            return Err(ProofError::InvalidArgument(format!(
                "key size must be in 1..={MAX_KEY_SIZE_BITS} bits, got {}",
                self.key_size_bits
            )));
        }
        if self.security_parameter == 0 || self.security_parameter > MAX_SECURITY_PARAMETER {
            return Err(ProofError::InvalidArgument(format!(
                "security parameter must be in 1..={MAX_SECURITY_PARAMETER}, got {}",
                self.security_parameter
            )));
        }
        if self.alpha < MIN_ALPHA || self.alpha > MAX_ALPHA {
            return Err(ProofError::InvalidArgument(format!(
                "alpha must be in {MIN_ALPHA}..={MAX_ALPHA}, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ProofSetup, DEFAULT_ALPHA, DEFAULT_SECURITY_PARAMETER, MAX_ALPHA};

    #[test]
    fn test_defaults() {
        let setup = ProofSetup::new(b"seed".to_vec(), 2048).unwrap();
        assert_eq!(setup.security_parameter(), DEFAULT_SECURITY_PARAMETER);
        assert_eq!(setup.alpha(), DEFAULT_ALPHA);
        assert_eq!(setup.key_size_bits(), 2048);
        assert_eq!(setup.public_seed(), b"seed");
    }

    #[test]
    fn test_rejects_zero_key_size() {
        assert!(ProofSetup::new(b"seed".to_vec(), 0).is_err());
    }

    #[test]
    fn test_rejects_zero_security_parameter() {
        assert!(ProofSetup::with_parameters(b"seed".to_vec(), 512, 0, DEFAULT_ALPHA).is_err());
    }

    #[test]
    fn test_rejects_alpha_out_of_range() {
        assert!(ProofSetup::with_parameters(b"seed".to_vec(), 512, 16, 7).is_err());
        assert!(ProofSetup::with_parameters(b"seed".to_vec(), 512, 16, MAX_ALPHA + 1).is_err());
        assert!(ProofSetup::with_parameters(b"seed".to_vec(), 512, 16, MAX_ALPHA).is_ok());
    }

    #[test]
    fn test_clones_are_independent_values() {
        let setup = ProofSetup::new(b"seed".to_vec(), 512).unwrap();
        let copy = setup.clone();
        drop(setup);
        assert_eq!(copy.key_size_bits(), 512);
    }

    #[test]
    fn test_serde_round_trip() {
        let setup = ProofSetup::with_parameters(b"beacon-42".to_vec(), 1024, 64, 48).unwrap();
        let encoded = serde_json::to_string(&setup).unwrap();
        let decoded: ProofSetup = serde_json::from_str(&encoded).unwrap();
        assert_eq!(setup, decoded);
    }
}
