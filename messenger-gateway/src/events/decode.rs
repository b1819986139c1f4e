//! Envelope decoding.

use super::types::Envelope;
use crate::error::DecodeError;

/// Decode a raw webhook body into an [`Envelope`].
///
/// Unknown fields are ignored and `null` reads as an absent value; malformed
/// JSON or a type mismatch anywhere in the tree is an error.
pub fn decode(raw_body: &[u8]) -> Result<Envelope, DecodeError> {
    let envelope: Option<Envelope> = serde_json::from_slice(raw_body)?;
    Ok(envelope.unwrap_or_default())
}
