//! Session and bearer token verification.
//!
//! Both token kinds are self-signed: the signature embeds the issuer's public
//! key, and the declared issuer must be the identity derived from that key.
//! Neither kind is trusted until its signature checks out.

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{AclError, Signed};
use super::keys::sign_data;
use super::types::{ContainerId, ObjectId, Operation, Signature, UserId, b64};

/// Epoch range a token is valid in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifetime {
    /// Issued at.
    pub iat: u64,
    /// Not valid before.
    pub nbf: u64,
    /// Last valid epoch.
    pub exp: u64,
}

impl Lifetime {
    pub fn is_valid_at(&self, epoch: u64) -> bool {
        self.iat <= epoch && self.nbf <= epoch && epoch <= self.exp
    }
}

/// What a session token authorizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub verb: Operation,
    pub container: ContainerId,
    /// Objects the session is limited to. Empty means the whole container.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBody {
    pub id: Uuid,
    pub issuer: UserId,
    pub lifetime: Lifetime,
    /// Public key the session holder signs requests with.
    #[serde(with = "b64")]
    pub session_key: Vec<u8>,
    pub context: SessionContext,
}

/// Short-lived token by which `issuer` delegates an object operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub body: SessionBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerBody {
    pub issuer: UserId,
    /// Container the token is limited to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerId>,
    /// User allowed to present the token. `None` means any holder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assert_user: Option<UserId>,
    pub lifetime: Lifetime,
}

/// Capability token a container owner hands out to widen access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    pub body: BearerBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
}

/// Length-prefixed binary writer for signed token bodies.
#[derive(Default)]
struct SignedData(Vec<u8>);

impl SignedData {
    fn tag(mut self, tag: &[u8]) -> Self {
        self.0.extend_from_slice(tag);
        self
    }

    fn bytes(mut self, bytes: &[u8]) -> Self {
        let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        self.0.extend_from_slice(&len.to_be_bytes());
        self.0.extend_from_slice(bytes);
        self
    }

    fn u64(mut self, value: u64) -> Self {
        self.0.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn opt(self, bytes: Option<&[u8]>) -> Self {
        match bytes {
            Some(bytes) => self.tag(&[1]).bytes(bytes),
            None => self.tag(&[0]),
        }
    }

    fn lifetime(self, lifetime: &Lifetime) -> Self {
        self.u64(lifetime.iat).u64(lifetime.nbf).u64(lifetime.exp)
    }
}

impl SessionBody {
    /// Bytes covered by the session token signature.
    pub fn signed_data(&self) -> Vec<u8> {
        let mut out = SignedData::default()
            .tag(b"object-session/v1")
            .bytes(self.id.as_bytes())
            .bytes(self.issuer.as_bytes())
            .lifetime(&self.lifetime)
            .bytes(&self.session_key)
            .tag(&[self.context.verb.tag()])
            .bytes(self.context.container.as_bytes())
            .u64(self.context.objects.len() as u64);
        for object in &self.context.objects {
            out = out.bytes(object.as_bytes());
        }
        out.0
    }
}

impl BearerBody {
    /// Bytes covered by the bearer token signature.
    pub fn signed_data(&self) -> Vec<u8> {
        SignedData::default()
            .tag(b"bearer/v1")
            .bytes(self.issuer.as_bytes())
            .opt(self.container.as_ref().map(ContainerId::as_bytes))
            .opt(self.assert_user.as_ref().map(UserId::as_bytes))
            .lifetime(&self.lifetime)
            .0
    }
}

/// Verify a token signature and return the signing key with its identity.
fn verify_signed(
    signature: Option<&Signature>,
    data: &[u8],
    subject: Signed,
    key_context: &'static str,
) -> Result<(UserId, Vec<u8>), AclError> {
    let signature = signature.ok_or(AclError::InvalidSignature { subject })?;

    let valid = signature
        .verify(data)
        .map_err(|e| AclError::malformed_key(key_context, e))?;
    if !valid {
        return Err(AclError::InvalidSignature { subject });
    }

    let signer = UserId::from_public_key(&signature.key)
        .map_err(|e| AclError::malformed_key(key_context, e))?;

    Ok((signer, signature.key.clone()))
}

impl SessionToken {
    pub fn new(body: SessionBody) -> Self {
        Self {
            body,
            signature: None,
        }
    }

    pub fn issuer(&self) -> &UserId {
        &self.body.issuer
    }

    /// Sign the token body with the issuer's key.
    pub fn sign(&mut self, key: &SigningKey) {
        self.signature = Some(sign_data(key, &self.body.signed_data()));
    }

    /// Check the token signature and return `(issuer, issuer key)`.
    ///
    /// The declared issuer must be the identity of the signing key; a token
    /// signed by someone else on the issuer's behalf is rejected.
    pub fn verify(&self) -> Result<(UserId, Vec<u8>), AclError> {
        let (signer, key) = verify_signed(
            self.signature.as_ref(),
            &self.body.signed_data(),
            Signed::SessionToken,
            "invalid key in session token signature",
        )?;

        if signer != self.body.issuer {
            return Err(AclError::InvalidSessionOwner);
        }

        Ok((signer, key))
    }

    /// Check that the token covers the requested operation at `epoch` and
    /// that the request was signed by the key the session was issued to.
    ///
    /// Only meaningful on a token whose signature already passed [`verify`].
    ///
    /// [`verify`]: SessionToken::verify
    pub fn validate_for(
        &self,
        holder_key: &[u8],
        operation: Operation,
        container: &ContainerId,
        object: Option<&ObjectId>,
        epoch: u64,
    ) -> Result<(), AclError> {
        if self.body.session_key != holder_key {
            return Err(AclError::SessionKeyMismatch);
        }
        if !self.body.lifetime.is_valid_at(epoch) {
            return Err(AclError::TokenExpired {
                token: Signed::SessionToken,
                epoch,
            });
        }

        let ctx = &self.body.context;
        if ctx.verb != operation {
            return Err(AclError::SessionVerbMismatch {
                allowed: ctx.verb,
                requested: operation,
            });
        }
        if ctx.container != *container {
            return Err(AclError::SessionContainerMismatch);
        }
        if let Some(object) = object
            && !ctx.objects.is_empty()
            && !ctx.objects.contains(object)
        {
            return Err(AclError::SessionObjectMismatch);
        }

        Ok(())
    }
}

impl BearerToken {
    pub fn new(body: BearerBody) -> Self {
        Self {
            body,
            signature: None,
        }
    }

    pub fn sign(&mut self, key: &SigningKey) {
        self.signature = Some(sign_data(key, &self.body.signed_data()));
    }
}

/// Validate a bearer token presented with a request.
///
/// The token must be signed by the container owner, be valid at `epoch`,
/// target `container` (when limited to one) and, when bound to a user, be
/// presented by that user. It never changes who the sender is.
pub fn verify_bearer(
    token: &BearerToken,
    container: &ContainerId,
    container_owner: &UserId,
    sender: &UserId,
    epoch: u64,
) -> Result<(), AclError> {
    let (signer, _) = verify_signed(
        token.signature.as_ref(),
        &token.body.signed_data(),
        Signed::BearerToken,
        "invalid key in bearer token signature",
    )?;

    let body = &token.body;
    if signer != body.issuer {
        return Err(AclError::InvalidBearerIssuer);
    }
    if !body.lifetime.is_valid_at(epoch) {
        return Err(AclError::TokenExpired {
            token: Signed::BearerToken,
            epoch,
        });
    }
    if let Some(target) = &body.container
        && target != container
    {
        return Err(AclError::BearerContainerMismatch);
    }
    if signer != *container_owner {
        return Err(AclError::BearerIssuerNotOwner);
    }
    if let Some(user) = &body.assert_user
        && user != sender
    {
        return Err(AclError::BearerUserMismatch);
    }

    Ok(())
}
