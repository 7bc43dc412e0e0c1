//! Identifiers and request primitives shared by the access-control pipeline.
//!
//! Everything here is plain data: parsing, formatting and (de)serialization.
//! Key decoding and signature checks live in `keys`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::keys::{self, KeyError};

/// Version byte prefixed to every user id.
pub const USER_ID_VERSION: u8 = 0x35;

const USER_ID_HASH_LEN: usize = 20;
const USER_ID_CHECKSUM_LEN: usize = 4;

/// Encoded user id length: version + key hash + checksum.
pub const USER_ID_LEN: usize = 1 + USER_ID_HASH_LEN + USER_ID_CHECKSUM_LEN;

/// Length of container and object identifiers (SHA-256 digest).
pub const DIGEST_ID_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("invalid id length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("unsupported user id version: {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("user id checksum mismatch")]
    ChecksumMismatch,
}

fn checksum(prefix: &[u8]) -> [u8; USER_ID_CHECKSUM_LEN] {
    let digest = Sha256::digest(Sha256::digest(prefix));
    let mut out = [0u8; USER_ID_CHECKSUM_LEN];
    out.copy_from_slice(&digest[..USER_ID_CHECKSUM_LEN]);
    out
}

/// Canonical identity of a storage user.
///
/// Derived from a public key: `version || SHA-256(key)[..20] || checksum`,
/// where the checksum is the first four bytes of a double SHA-256 over the
/// first 21 bytes. Two ids are the same user iff their bytes are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId([u8; USER_ID_LEN]);

impl UserId {
    /// Derive the user id of a raw Ed25519 public key.
    ///
    /// The key must decode to a valid curve point; the id is computed over the
    /// exact bytes given, so the pair `(id, key)` never diverges.
    pub fn from_public_key(raw: &[u8]) -> Result<Self, KeyError> {
        keys::decode_public_key(raw)?;

        let mut out = [0u8; USER_ID_LEN];
        out[0] = USER_ID_VERSION;
        out[1..=USER_ID_HASH_LEN].copy_from_slice(&Sha256::digest(raw)[..USER_ID_HASH_LEN]);
        let sum = checksum(&out[..=USER_ID_HASH_LEN]);
        out[USER_ID_HASH_LEN + 1..].copy_from_slice(&sum);

        Ok(Self(out))
    }

    /// Parse an encoded id, validating version and checksum.
    pub fn from_slice(raw: &[u8]) -> Result<Self, IdError> {
        let bytes: [u8; USER_ID_LEN] = raw.try_into().map_err(|_| IdError::InvalidLength {
            expected: USER_ID_LEN,
            actual: raw.len(),
        })?;

        if bytes[0] != USER_ID_VERSION {
            return Err(IdError::UnsupportedVersion(bytes[0]));
        }
        if checksum(&bytes[..=USER_ID_HASH_LEN]) != bytes[USER_ID_HASH_LEN + 1..] {
            return Err(IdError::ChecksumMismatch);
        }

        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({self})")
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(&hex::decode(s)?)
    }
}

/// Declares a 32-byte digest identifier with hex text form.
macro_rules! digest_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; DIGEST_ID_LEN]);

        impl $name {
            pub const fn from_bytes(bytes: [u8; DIGEST_ID_LEN]) -> Self {
                Self(bytes)
            }

            pub fn from_slice(raw: &[u8]) -> Result<Self, IdError> {
                raw.try_into()
                    .map(Self)
                    .map_err(|_| IdError::InvalidLength {
                        expected: DIGEST_ID_LEN,
                        actual: raw.len(),
                    })
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_slice(&hex::decode(s)?)
            }
        }
    };
}

digest_id!(
    /// Identifier of a container.
    ContainerId
);
digest_id!(
    /// Identifier of an object inside a container.
    ObjectId
);

/// Serialize identifiers through their hex text form.
macro_rules! text_serde {
    ($($name:ident),+) => {$(
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    )+};
}

text_serde!(UserId, ContainerId, ObjectId);

/// Base64 (standard alphabet) encoding for raw byte fields.
pub(crate) mod b64 {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

/// A signature together with the raw public key that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "b64")]
    pub key: Vec<u8>,
    #[serde(with = "b64")]
    pub sign: Vec<u8>,
}

/// Transport-level signature envelope of a request.
///
/// Every forwarding hop wraps the header it received as `origin` and adds its
/// own meta/origin signatures. The innermost header carries the body
/// signature of the node or client that created the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestVerificationHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_signature: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_signature: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_signature: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Box<RequestVerificationHeader>>,
}

/// Object-service operation being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Get,
    Head,
    Put,
    Delete,
    Search,
    Range,
    RangeHash,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Head => "head",
            Self::Put => "put",
            Self::Delete => "delete",
            Self::Search => "search",
            Self::Range => "range",
            Self::RangeHash => "range_hash",
        }
    }

    /// Stable numeric tag used in signed token bodies.
    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Get => 1,
            Self::Head => 2,
            Self::Put => 3,
            Self::Delete => 4,
            Self::Search => 5,
            Self::Range => 6,
            Self::RangeHash => 7,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "head" => Ok(Self::Head),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            "search" => Ok(Self::Search),
            "range" => Ok(Self::Range),
            "range_hash" | "rangehash" => Ok(Self::RangeHash),
            other => Err(format!("unknown operation: {other}")),
        }
    }
}

/// Access tier of the request sender with respect to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    ContainerSystem,
    Other,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Owner => "owner",
            Self::ContainerSystem => "container_system",
            Self::Other => "other",
        })
    }
}

/// Basic ACL mask fixed at container creation.
///
/// Opaque to this layer: it is carried into the request context for the
/// authorization gate and never interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasicAcl(u32);

impl BasicAcl {
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BasicAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::SigningKey;

    fn key(seed: u8) -> Vec<u8> {
        SigningKey::from_bytes(&[seed; 32])
            .verifying_key()
            .to_bytes()
            .to_vec()
    }

    #[test]
    fn user_id_is_stable_for_a_key() {
        let a = UserId::from_public_key(&key(1)).unwrap();
        let b = UserId::from_public_key(&key(1)).unwrap();
        let c = UserId::from_public_key(&key(2)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_bytes()[0], USER_ID_VERSION);
    }

    #[test]
    fn user_id_text_form_round_trips_and_checks_checksum() {
        let id = UserId::from_public_key(&key(3)).unwrap();
        let text = id.to_string();
        assert_eq!(text.len(), USER_ID_LEN * 2);
        assert_eq!(text.parse::<UserId>().unwrap(), id);

        let mut raw = id.as_bytes().to_vec();
        raw[5] ^= 0xff;
        assert!(matches!(
            UserId::from_slice(&raw),
            Err(IdError::ChecksumMismatch)
        ));
    }

    #[test]
    fn user_id_rejects_wrong_version_and_length() {
        let mut raw = UserId::from_public_key(&key(4)).unwrap().as_bytes().to_vec();
        raw[0] = 0x17;
        assert!(matches!(
            UserId::from_slice(&raw),
            Err(IdError::UnsupportedVersion(0x17))
        ));
        assert!(matches!(
            UserId::from_slice(&raw[..10]),
            Err(IdError::InvalidLength { actual: 10, .. })
        ));
    }

    #[test]
    fn user_id_rejects_short_key() {
        assert!(UserId::from_public_key(&[1, 2, 3]).is_err());
    }

    #[test]
    fn container_id_parses_hex() {
        let id = ContainerId::from_bytes([0xab; 32]);
        assert_eq!(id.to_string().parse::<ContainerId>().unwrap(), id);
        assert!("zz".parse::<ContainerId>().is_err());
        assert!("abcd".parse::<ContainerId>().is_err());
    }

    #[test]
    fn signature_serializes_bytes_as_base64() {
        let sig = Signature {
            key: vec![1, 2, 3],
            sign: vec![4, 5],
        };
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["key"], "AQID");
        assert_eq!(json["sign"], "BAU=");

        let back: Signature = serde_json::from_value(json).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn operation_and_role_use_snake_case() {
        assert_eq!(
            serde_json::to_value(Operation::RangeHash).unwrap(),
            "range_hash"
        );
        assert_eq!(
            serde_json::to_value(Role::ContainerSystem).unwrap(),
            "container_system"
        );
        assert_eq!("PUT".parse::<Operation>().unwrap(), Operation::Put);
        assert!("lock".parse::<Operation>().is_err());
    }

    #[test]
    fn basic_acl_displays_as_hex() {
        assert_eq!(BasicAcl::from_bits(0x1fbf_8fff).to_string(), "0x1fbf8fff");
    }
}
