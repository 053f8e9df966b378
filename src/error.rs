//! Error taxonomy for setup construction, mask expansion and proof handling.
//!
//! Argument and structural failures are detected eagerly, before any modular
//! arithmetic runs, and are surfaced as errors to the caller.  A proof that is
//! structurally well formed but cryptographically wrong is not an error: the
//! verifier reports it as an ordinary `false` outcome.

use thiserror::Error;

/// Errors raised while validating setups, expanding masks, generating proofs
/// or decoding received proofs.
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("invalid argument: {0}")]
    /// Malformed caller input: zero sizes, exhausted counters, parameters
    /// outside their documented ranges.
    InvalidArgument(String),
    #[error("invalid key material: {0}")]
    /// Secret factorization inconsistent with the declared key size.  Only
    /// proof generation sees key material, so only it raises this variant.
    InvalidKeyMaterial(String),
    #[error("malformed proof: {0}")]
    /// Structurally broken proof: wrong round count, truncated or otherwise
    /// corrupt encoding.  Detected before any numeric check is attempted.
    MalformedProof(String),
}
