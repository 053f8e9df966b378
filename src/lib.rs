#![deny(missing_docs)]

//! # modulus_guard
//!
//! **modulus_guard** is a pure computation crate for proving, without
//! interaction and without revealing any factor, that an RSA-style modulus
//! was honestly constructed: that it is a product of exactly two primes of
//! similar size matching a declared bit length.  Registration and admission
//! flows use it to keep maliciously crafted moduli (trapdoored, smooth or
//! mis-sized) out of a permissioned set.
//!
//! ## Components
//!
//! * **Mask generation**: [`MaskGenerator`] deterministically expands a seed
//!   into an arbitrary-length byte stream with the MGF1 construction.  It is
//!   the sole source of randomness in the protocol, so prover and verifier
//!   derive identical challenges from identical public inputs.
//! * **Challenge derivation**: [`challenge::derive_challenges`] turns the
//!   mask stream into uniform bounded integers by rejection sampling, bound
//!   to the public seed and the modulus under test.
//! * **Proof engine**: [`ModulusProof::generate`] consumes a
//!   [`SecretFactorization`] and produces a compact proof, one value per
//!   challenge round plus one aggregate response;
//!   [`ModulusProof::verify`] checks a received proof against the public
//!   modulus alone.  A cheating prover passes with probability at most
//!   `2^-security_parameter`.
//! * **Setup**: [`ProofSetup`] is the immutable record of public parameters
//!   both sides must share.
//!
//! ## Usage
//!
//! ```rust
//! use modulus_guard::{ModulusProof, ProofSetup, SecretFactorization};
//! use num_bigint::BigUint;
//!
//! fn prime(hex: &str) -> BigUint {
//!     BigUint::parse_bytes(hex.as_bytes(), 16).unwrap()
//! }
//!
//! // Two 256-bit primes held by the prover.
//! let p = prime("91069b2216924491278adf7d3484f8a4205d76b0f7c1ef40e2640eba394700e5");
//! let q = prime("e6732023d0069700b1aa1ea795788f8d630341de9a866c51848f41a59b90922f");
//! let secret = SecretFactorization::new(p, q).unwrap();
//!
//! // Public parameters shared with every verifier.
//! let setup = ProofSetup::with_parameters(b"redstoneredstone".to_vec(), 512, 16, 40).unwrap();
//!
//! let proof = ModulusProof::generate(&setup, &secret).unwrap();
//! let modulus = secret.modulus();
//! assert!(proof.verify(&setup, &modulus).unwrap());
//!
//! // The proof travels as bytes and survives the round trip unchanged.
//! let wire = proof.to_bytes();
//! assert_eq!(ModulusProof::from_bytes(&wire).unwrap(), proof);
//! ```
//!
//! The crate performs no I/O, holds no global state, and all operations are
//! pure functions that may run concurrently over shared setups.

pub mod challenge;
mod codec;
mod engine;
mod error;
mod mask;
mod setup;

pub use engine::{ModulusProof, SecretFactorization};
pub use error::ProofError;
pub use mask::{
    Blake2b256, Blake2bMaskGenerator, MaskGenerator, Sha256MaskGenerator, Sha3MaskGenerator,
};
pub use setup::{
    ProofSetup, DEFAULT_ALPHA, DEFAULT_SECURITY_PARAMETER, MAX_ALPHA, MAX_KEY_SIZE_BITS,
    MAX_SECURITY_PARAMETER, MIN_ALPHA,
};
