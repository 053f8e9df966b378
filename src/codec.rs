//! Deterministic proof encodings.
//!
//! Two byte-for-byte reproducible formats are provided for [`ModulusProof`]:
//! a compact binary layout and a JSON form for registration plumbing that
//! already speaks JSON.  Every integer travels as an explicit length plus a
//! minimal big-endian magnitude, never as an implicit fixed width, so no
//! value can be silently truncated in flight.  Decoding is strict: trailing
//! bytes, truncation and zero-padded magnitudes are all rejected.

use num_bigint::BigUint;
use num_traits::Zero;
use serde_json::json;

use crate::engine::ModulusProof;
use crate::error::ProofError;

/// Minimal big-endian magnitude of `value`; zero encodes as the empty
/// string of bytes.
pub(crate) fn min_be_bytes(value: &BigUint) -> Vec<u8> {
    if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

fn push_integer(out: &mut Vec<u8>, value: &BigUint) {
    let bytes = min_be_bytes(value);
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(&bytes);
}

/// Strict reader over a binary proof payload.
struct Reader<'a> {
    input: &'a [u8],
}

impl<'a> Reader<'a> {
    fn read_u32(&mut self) -> Result<u32, ProofError> {
        if self.input.len() < 4 {
            return Err(ProofError::MalformedProof(
                "truncated length prefix".to_string(),
            ));
        }
        let (head, tail) = self.input.split_at(4);
        self.input = tail;
        Ok(u32::from_be_bytes([head[0], head[1], head[2], head[3]]))
    }

    fn read_integer(&mut self) -> Result<BigUint, ProofError> {
        let length = self.read_u32()? as usize;
        if self.input.len() < length {
            return Err(ProofError::MalformedProof(
                "truncated integer payload".to_string(),
            ));
        }
        let (bytes, tail) = self.input.split_at(length);
        self.input = tail;
        if !bytes.is_empty() && bytes[0] == 0 {
            return Err(ProofError::MalformedProof(
                "integer magnitude has a leading zero byte".to_string(),
            ));
        }
        Ok(BigUint::from_bytes_be(bytes))
    }
}

fn integer_from_hex(input: &str) -> Result<BigUint, ProofError> {
    let bytes = hex::decode(input)
        .map_err(|err| ProofError::MalformedProof(format!("invalid hex magnitude: {err}")))?;
    if !bytes.is_empty() && bytes[0] == 0 {
        return Err(ProofError::MalformedProof(
            "integer magnitude has a leading zero byte".to_string(),
        ));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

impl ModulusProof {
    /// Serialises the proof to the binary layout: a big-endian round count,
    /// each round value as `BE32(len) || magnitude`, then the aggregate
    /// value in the same shape.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.rounds().len() as u32).to_be_bytes());
        for value in self.rounds() {
            push_integer(&mut out, value);
        }
        push_integer(&mut out, self.aggregate());
        out
    }

    /// Parses a proof previously emitted by [`ModulusProof::to_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::MalformedProof`] for truncated input, trailing
    /// bytes or non-minimal integer magnitudes.
    pub fn from_bytes(input: &[u8]) -> Result<Self, ProofError> {
        let mut reader = Reader { input };
        let count = reader.read_u32()? as usize;
        // Each round needs at least its length prefix, so absurd counts are
        // rejected before any allocation.
        if count > reader.input.len() / 4 {
            return Err(ProofError::MalformedProof(format!(
                "round count {count} exceeds the payload"
            )));
        }
        let mut rounds = Vec::with_capacity(count);
        for _ in 0..count {
            rounds.push(reader.read_integer()?);
        }
        let aggregate = reader.read_integer()?;
        if !reader.input.is_empty() {
            return Err(ProofError::MalformedProof(
                "trailing bytes after aggregate value".to_string(),
            ));
        }
        Ok(ModulusProof::from_parts(rounds, aggregate))
    }

    /// Serialises the proof to a JSON object with lowercase hex magnitudes.
    pub fn to_json_string(&self) -> String {
        let rounds: Vec<String> = self
            .rounds()
            .iter()
            .map(|value| hex::encode(min_be_bytes(value)))
            .collect();
        json!({
            "rounds": rounds,
            "aggregate": hex::encode(min_be_bytes(self.aggregate()))
        })
        .to_string()
    }

    /// Parses a proof previously emitted by [`ModulusProof::to_json_string`].
    ///
    /// # Errors
    ///
    /// Returns [`ProofError::MalformedProof`] for invalid JSON, missing
    /// fields or invalid hex magnitudes.
    pub fn from_json_str(input: &str) -> Result<Self, ProofError> {
        let value: serde_json::Value = serde_json::from_str(input)
            .map_err(|err| ProofError::MalformedProof(format!("invalid proof JSON: {err}")))?;
        let rounds_value = value
            .get("rounds")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProofError::MalformedProof("missing rounds array".to_string()))?;
        let mut rounds = Vec::with_capacity(rounds_value.len());
        for entry in rounds_value {
            let text = entry.as_str().ok_or_else(|| {
                ProofError::MalformedProof("round value is not a string".to_string())
            })?;
            rounds.push(integer_from_hex(text)?);
        }
        let aggregate = integer_from_hex(
            value
                .get("aggregate")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ProofError::MalformedProof("missing aggregate value".to_string()))?,
        )?;
        Ok(ModulusProof::from_parts(rounds, aggregate))
    }
}
