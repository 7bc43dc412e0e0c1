//! Ed25519 key decoding and signature checks.
//!
//! The rest of the pipeline only sees raw key bytes; this module is the one
//! place that knows which curve they belong to.

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};

use super::types::Signature;

/// Raw Ed25519 public key length.
pub const PUBLIC_KEY_LEN: usize = 32;

/// 32 bytes that do not decompress to a curve point (y = 2 has no x).
#[cfg(test)]
pub(crate) const OFF_CURVE_KEY: [u8; PUBLIC_KEY_LEN] = {
    let mut raw = [0u8; PUBLIC_KEY_LEN];
    raw[0] = 2;
    raw
};

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid public key length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid public key: {0}")]
    InvalidPoint(#[source] ed25519_dalek::SignatureError),
}

/// Decode raw public key bytes into a verifying key.
pub fn decode_public_key(raw: &[u8]) -> Result<VerifyingKey, KeyError> {
    let bytes: &[u8; PUBLIC_KEY_LEN] = raw.try_into().map_err(|_| KeyError::InvalidLength {
        expected: PUBLIC_KEY_LEN,
        actual: raw.len(),
    })?;

    VerifyingKey::from_bytes(bytes).map_err(KeyError::InvalidPoint)
}

/// Check `sign` over `data` with `key`.
///
/// Uses strict verification (rejects small-order keys and malleable
/// signatures). A signature of the wrong length simply does not verify.
pub fn verify_signature(key: &VerifyingKey, data: &[u8], sign: &[u8]) -> bool {
    let Ok(sig) = ed25519_dalek::Signature::from_slice(sign) else {
        return false;
    };
    key.verify_strict(data, &sig).is_ok()
}

/// Sign `data`, producing a signature that carries the signer's public key.
pub fn sign_data(key: &SigningKey, data: &[u8]) -> Signature {
    Signature {
        key: key.verifying_key().to_bytes().to_vec(),
        sign: key.sign(data).to_bytes().to_vec(),
    }
}

impl Signature {
    /// Decode the embedded key and check the signature over `data`.
    ///
    /// `Err` means the key itself is unusable; `Ok(false)` means the key is
    /// fine but the signature does not match.
    pub fn verify(&self, data: &[u8]) -> Result<bool, KeyError> {
        let key = decode_public_key(&self.key)?;
        Ok(verify_signature(&key, data, &self.sign))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_data_verifies() {
        let key = SigningKey::from_bytes(&[7; 32]);
        let sig = sign_data(&key, b"payload");

        assert_eq!(sig.key.len(), PUBLIC_KEY_LEN);
        assert!(sig.verify(b"payload").unwrap());
        assert!(!sig.verify(b"other payload").unwrap());
    }

    #[test]
    fn foreign_key_does_not_verify() {
        let mut sig = sign_data(&SigningKey::from_bytes(&[7; 32]), b"payload");
        sig.key = SigningKey::from_bytes(&[8; 32])
            .verifying_key()
            .to_bytes()
            .to_vec();

        assert!(!sig.verify(b"payload").unwrap());
    }

    #[test]
    fn truncated_signature_does_not_verify() {
        let mut sig = sign_data(&SigningKey::from_bytes(&[7; 32]), b"payload");
        sig.sign.truncate(10);

        assert!(!sig.verify(b"payload").unwrap());
    }

    #[test]
    fn off_curve_key_is_an_error() {
        assert!(matches!(
            decode_public_key(&OFF_CURVE_KEY),
            Err(KeyError::InvalidPoint(_))
        ));
    }

    #[test]
    fn wrong_key_length_is_an_error() {
        let err = decode_public_key(&[0u8; 33]).unwrap_err();
        assert!(matches!(
            err,
            KeyError::InvalidLength {
                expected: 32,
                actual: 33
            }
        ));
    }
}
