//! Verification header inspection.
//!
//! A request that crossed several nodes carries one header per hop, each
//! wrapping the previous one as `origin`. Only the innermost header's body
//! signature belongs to the party that created the request.

use ed25519_dalek::SigningKey;

use super::error::{AclError, Signed};
use super::keys::sign_data;
use super::types::{RequestVerificationHeader, Signature};

/// Body signature of the innermost (first applied) header, if any.
pub fn original_body_signature(header: &RequestVerificationHeader) -> Option<&Signature> {
    let mut current = header;
    while let Some(origin) = current.origin.as_deref() {
        current = origin;
    }
    current.body_signature.as_ref()
}

/// Raw public key of the original body signature.
pub fn body_signature_key(header: Option<&RequestVerificationHeader>) -> Result<&[u8], AclError> {
    let header = header.ok_or(AclError::EmptyVerificationHeader)?;
    let signature = original_body_signature(header).ok_or(AclError::EmptyBodySignature)?;
    Ok(&signature.key)
}

/// Check the original body signature against the request body bytes.
pub fn verify_body_signature(
    body: &[u8],
    header: Option<&RequestVerificationHeader>,
) -> Result<(), AclError> {
    let header = header.ok_or(AclError::EmptyVerificationHeader)?;
    let signature = original_body_signature(header).ok_or(AclError::EmptyBodySignature)?;

    let valid = signature
        .verify(body)
        .map_err(|e| AclError::malformed_key("invalid key in body signature", e))?;
    if !valid {
        return Err(AclError::InvalidSignature {
            subject: Signed::RequestBody,
        });
    }

    Ok(())
}

impl RequestVerificationHeader {
    /// Header of a freshly created request: `key` signs the body.
    pub fn signed(key: &SigningKey, body: &[u8]) -> Self {
        Self {
            body_signature: Some(sign_data(key, body)),
            ..Self::default()
        }
    }

    /// Wrap this header for the next hop.
    ///
    /// The hop signs its meta header bytes and the origin's body signature;
    /// the outer header never carries a body signature of its own.
    pub fn forward(self, hop_key: &SigningKey, meta: &[u8]) -> Self {
        let origin_sig = original_body_signature(&self)
            .map(|sig| sig.sign.clone())
            .unwrap_or_default();

        Self {
            body_signature: None,
            meta_signature: Some(sign_data(hop_key, meta)),
            origin_signature: Some(sign_data(hop_key, &origin_sig)),
            origin: Some(Box::new(self)),
        }
    }
}
