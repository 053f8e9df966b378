//! Proof generation and verification.
//!
//! The protocol is a non-interactive variant of the Poupard-Stern proof of
//! knowledge of a modulus' totient.  The prover derives challenge bases
//! `x_1 .. x_k` from the public seed and the modulus, commits to them with a
//! single secret exponent `r` as `y_i = x_i^r mod N`, and answers the
//! aggregate exponent `e` (itself derived from the seed, the modulus and
//! every `y_i`) with `Y = r + e * (N - phi(N))`.  The verifier recomputes
//! the challenges and accepts when `x_i^Y == y_i * x_i^(e*N) (mod N)` holds
//! for every round and `Y` lies below the public range bound.
//!
//! The exponent relation alone cannot separate a balanced semiprime from a
//! prime or from a prime square, both of which also have a small totient
//! gap.  Verification therefore adds public structure checks on the modulus
//! itself: it must be odd, fail a derived-witness compositeness test, and
//! not be a perfect power.  Together with the range bound on `Y`, a modulus
//! accepted here is a product of exactly two primes of similar size, except
//! with probability `2^-security_parameter` plus a term negligible in the
//! modulus size.

use std::fmt;

use blake2::digest::Digest;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Pow};
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

use crate::challenge;
use crate::error::ProofError;
use crate::mask::Blake2b256;
use crate::setup::ProofSetup;

/// Moduli smaller than this cannot host the witness derivation and are
/// rejected outright.
const MIN_MODULUS: u32 = 15;

/// Minimum number of compositeness witnesses checked during verification,
/// regardless of how few challenge rounds the setup requests.
const WITNESS_FLOOR: usize = 32;

/// Round count above which the exponentiation loops fan out across threads.
#[cfg(not(target_arch = "wasm32"))]
const PARALLEL_ROUND_THRESHOLD: usize = 8;

/// The prover's secret: the two prime factors of the modulus.
///
/// The type is deliberately sealed off from the proof data path.  It cannot
/// be serialized, is never embedded in a [`ModulusProof`], and its debug
/// representation discloses only the factor sizes.
#[derive(Clone)]
pub struct SecretFactorization {
    p: BigUint,
    q: BigUint,
}

impl SecretFactorization {
    /// Wraps the two prime factors of a modulus.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::InvalidKeyMaterial`] if either factor is below
    /// two or the factors are equal (a square modulus can never verify).
    pub fn new(p: BigUint, q: BigUint) -> Result<Self, ProofError> {
        let two = BigUint::from(2u32);
        if p < two || q < two {
            return Err(ProofError::InvalidKeyMaterial(
                "factors must both exceed one".to_string(),
            ));
        }
        if p == q {
            return Err(ProofError::InvalidKeyMaterial(
                "factors must be distinct".to_string(),
            ));
        }
        Ok(Self { p, q })
    }

    /// Recomputes the public modulus `p * q`.
    pub fn modulus(&self) -> BigUint {
        &self.p * &self.q
    }

    /// Euler's totient `(p - 1) * (q - 1)`.
    fn totient(&self) -> BigUint {
        (&self.p - 1u32) * (&self.q - 1u32)
    }
}

impl fmt::Debug for SecretFactorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretFactorization")
            .field("p_bits", &self.p.bits())
            .field("q_bits", &self.q.bits())
            .finish()
    }
}

/// Range bounds shared by generation and verification.
///
/// With `b = key_size_bits`, `k = security_parameter` and `a = alpha`, the
/// totient gap of a balanced semiprime is below `C = 2^(ceil(b/2)+2)`, the
/// aggregate exponent is below `B = 2^k`, the nonce is drawn from
/// `[0, B*C*2^a)` and honest aggregates stay below `B*C*2^a + B*C`.
struct ProofBounds {
    nonce_bound: BigUint,
    aggregate_limit: BigUint,
}

impl ProofBounds {
    fn for_setup(setup: &ProofSetup) -> Self {
        let half = (setup.key_size_bits() + 1) / 2;
        let slack = BigUint::one() << (half + 2 + setup.security_parameter());
        let nonce_bound = &slack << setup.alpha();
        let aggregate_limit = &nonce_bound + &slack;
        Self {
            nonce_bound,
            aggregate_limit,
        }
    }
}

/// A non-interactive validity proof for one modulus under one setup.
///
/// Holds one value per challenge round, in round order, plus the aggregate
/// response binding the rounds together.  Instances are immutable; the
/// encodings in [`crate::codec`] reproduce them bit for bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModulusProof {
    rounds: Vec<BigUint>,
    aggregate: BigUint,
}

impl ModulusProof {
    /// Assembles a proof from raw parts, without validation.  The verifier
    /// treats every proof as untrusted, so decoded or hand-built instances
    /// carry no special status.
    pub fn from_parts(rounds: Vec<BigUint>, aggregate: BigUint) -> Self {
        Self { rounds, aggregate }
    }

    /// Per-round values in round order.
    pub fn rounds(&self) -> &[BigUint] {
        &self.rounds
    }

    /// Aggregate response binding all rounds.
    pub fn aggregate(&self) -> &BigUint {
        &self.aggregate
    }

    /// Generates a proof for the modulus determined by `secret`, using the
    /// default BLAKE2b-256 mask digest.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::InvalidArgument`] for an inconsistent setup and
    /// [`ProofError::InvalidKeyMaterial`] if the factors do not multiply to
    /// a modulus of the declared size (one bit of tolerance).
    pub fn generate(setup: &ProofSetup, secret: &SecretFactorization) -> Result<Self, ProofError> {
        Self::generate_with_digest::<Blake2b256>(setup, secret)
    }

    /// [`ModulusProof::generate`] over a caller-chosen mask digest.  Prover
    /// and verifier must agree on the digest choice out of band.
    pub fn generate_with_digest<D: Digest>(
        setup: &ProofSetup,
        secret: &SecretFactorization,
    ) -> Result<Self, ProofError> {
        setup.validate()?;
        let modulus = secret.modulus();
        let declared = u64::from(setup.key_size_bits());
        if modulus.bits().abs_diff(declared) > 1 {
            return Err(ProofError::InvalidKeyMaterial(format!(
                "factors produce a {}-bit modulus, setup declares {declared} bits",
                modulus.bits()
            )));
        }
        let bounds = ProofBounds::for_setup(setup);
        let nonce = challenge::derive_secret_nonce::<D>(
            setup,
            &modulus,
            &secret.p,
            &secret.q,
            &bounds.nonce_bound,
        )?;
        let bases = challenge::derive_challenges_with_digest::<D>(
            setup,
            &modulus,
            setup.security_parameter() as usize,
            &modulus,
        )?;
        let rounds = map_rounds(&bases, |base| base.modpow(&nonce, &modulus));
        let exponent = challenge::derive_aggregate_exponent::<D>(setup, &modulus, &rounds)?;
        let aggregate = nonce + exponent * (&modulus - secret.totient());
        Ok(Self { rounds, aggregate })
    }

    /// Verifies this proof against a public modulus, using the default
    /// BLAKE2b-256 mask digest.
    ///
    /// Returns `Ok(false)` for any cryptographically invalid but well-formed
    /// proof; that outcome is expected, not exceptional.  Every round is
    /// checked unconditionally, so a rejection does not reveal which round
    /// failed.
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::InvalidArgument`] for an inconsistent setup and
    /// [`ProofError::MalformedProof`] if the round count does not match the
    /// setup's security parameter.
    pub fn verify(&self, setup: &ProofSetup, modulus: &BigUint) -> Result<bool, ProofError> {
        self.verify_with_digest::<Blake2b256>(setup, modulus)
    }

    /// [`ModulusProof::verify`] over a caller-chosen mask digest.
    pub fn verify_with_digest<D: Digest>(
        &self,
        setup: &ProofSetup,
        modulus: &BigUint,
    ) -> Result<bool, ProofError> {
        setup.validate()?;
        let expected = setup.security_parameter() as usize;
        if self.rounds.len() != expected {
            return Err(ProofError::MalformedProof(format!(
                "expected {expected} rounds, proof carries {}",
                self.rounds.len()
            )));
        }
        let declared = u64::from(setup.key_size_bits());
        if modulus.bits().abs_diff(declared) > 1 || *modulus < BigUint::from(MIN_MODULUS) {
            return Ok(false);
        }
        let bounds = ProofBounds::for_setup(setup);
        let bases = challenge::derive_challenges_with_digest::<D>(setup, modulus, expected, modulus)?;
        let exponent = challenge::derive_aggregate_exponent::<D>(setup, modulus, &self.rounds)?;
        let witness_count = expected.max(WITNESS_FLOOR);
        let witnesses = challenge::derive_witnesses::<D>(setup, modulus, witness_count)?;

        let mut accept = modulus.is_odd();
        accept &= !is_probable_prime(modulus, &witnesses);
        accept &= !is_perfect_power(modulus);
        accept &= self.aggregate < bounds.aggregate_limit;

        let lifted = &exponent * modulus;
        let checks = map_round_checks(&bases, &self.rounds, |base, round| {
            let in_range = round < modulus;
            let lhs = base.modpow(&self.aggregate, modulus);
            let rhs = (round * base.modpow(&lifted, modulus)) % modulus;
            in_range & (lhs == rhs)
        });
        for check in checks {
            accept &= check;
        }
        Ok(accept)
    }
}

/// Applies `f` to every base, fanning out across threads for large round
/// counts.  Output order always matches input order.
fn map_rounds<F>(bases: &[BigUint], f: F) -> Vec<BigUint>
where
    F: Fn(&BigUint) -> BigUint + Send + Sync,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        if bases.len() >= PARALLEL_ROUND_THRESHOLD && rayon::current_num_threads() > 1 {
            return bases.par_iter().map(&f).collect();
        }
    }
    bases.iter().map(&f).collect()
}

/// Evaluates `f` over every `(base, round)` pair, in order.
fn map_round_checks<F>(bases: &[BigUint], rounds: &[BigUint], f: F) -> Vec<bool>
where
    F: Fn(&BigUint, &BigUint) -> bool + Send + Sync,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        if bases.len() >= PARALLEL_ROUND_THRESHOLD && rayon::current_num_threads() > 1 {
            return bases
                .par_iter()
                .zip(rounds.par_iter())
                .map(|(base, round)| f(base, round))
                .collect();
        }
    }
    bases
        .iter()
        .zip(rounds.iter())
        .map(|(base, round)| f(base, round))
        .collect()
}

/// Strong probable-prime test over the supplied witnesses.
///
/// Returns `true` when no witness exposes a nontrivial factor structure,
/// i.e. the modulus looks prime.  The caller supplies witnesses drawn from
/// the seed-bound challenge stream, so the answer is deterministic per
/// `(seed, modulus)` pair.
fn is_probable_prime(n: &BigUint, witnesses: &[BigUint]) -> bool {
    if n.is_even() {
        return *n == BigUint::from(2u32);
    }
    let one = BigUint::one();
    let n_minus_one = n - &one;
    let mut odd_part = n_minus_one.clone();
    let mut doublings = 0u64;
    while odd_part.is_even() {
        odd_part >>= 1u32;
        doublings += 1;
    }
    'witnesses: for witness in witnesses {
        let mut x = witness.modpow(&odd_part, n);
        if x == one || x == n_minus_one {
            continue;
        }
        for _ in 1..doublings {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witnesses;
            }
        }
        return false;
    }
    true
}

/// Exact perfect-power detection via integer root extraction.
fn is_perfect_power(n: &BigUint) -> bool {
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }
    for degree in 2..=n.bits() {
        let degree = degree as u32;
        let root = n.nth_root(degree);
        if root <= BigUint::one() {
            break;
        }
        if Pow::pow(&root, degree) == *n {
            return true;
        }
    }
    false
}
