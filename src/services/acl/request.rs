//! Request owner resolution and the per-request decision context.

use std::fmt;

use super::classify::RoleClassifier;
use super::container::ContainerInfo;
use super::error::AclError;
use super::token::{BearerToken, SessionToken};
use super::types::{
    BasicAcl, ContainerId, ObjectId, Operation, RequestVerificationHeader, Role, UserId,
};
use super::vheader;

/// The verified sender of a request: a user id and the exact key bytes it
/// was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    user_id: UserId,
    public_key: Vec<u8>,
}

impl ResolvedIdentity {
    /// Derive the identity of `raw` key bytes. `context` prefixes the
    /// decode error.
    pub fn from_key(raw: &[u8], context: &'static str) -> Result<Self, AclError> {
        let user_id =
            UserId::from_public_key(raw).map_err(|e| AclError::malformed_key(context, e))?;
        Ok(Self {
            user_id,
            public_key: raw.to_vec(),
        })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }
}

/// Borrowed view of the trust material attached to a request.
///
/// `R` is the original protocol request. It is carried through for
/// downstream handlers and never inspected here.
pub struct TokenEnvelope<'a, R> {
    vheader: Option<&'a RequestVerificationHeader>,
    session: Option<&'a SessionToken>,
    bearer: Option<&'a BearerToken>,
    request: &'a R,
}

impl<'a, R> TokenEnvelope<'a, R> {
    pub fn new(request: &'a R) -> Self {
        Self {
            vheader: None,
            session: None,
            bearer: None,
            request,
        }
    }

    pub fn with_verification_header(mut self, header: Option<&'a RequestVerificationHeader>) -> Self {
        self.vheader = header;
        self
    }

    pub fn with_session_token(mut self, token: Option<&'a SessionToken>) -> Self {
        self.session = token;
        self
    }

    pub fn with_bearer_token(mut self, token: Option<&'a BearerToken>) -> Self {
        self.bearer = token;
        self
    }

    pub fn request(&self) -> &'a R {
        self.request
    }

    /// See [`resolve_owner`].
    pub fn request_owner(&self) -> Result<ResolvedIdentity, AclError> {
        resolve_owner(self)
    }
}

impl<R> fmt::Debug for TokenEnvelope<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEnvelope")
            .field("vheader", &self.vheader)
            .field("session", &self.session)
            .field("bearer", &self.bearer)
            .finish_non_exhaustive()
    }
}

/// Resolve the sender of a request.
///
/// Every request must carry a verification header. When a session token is
/// attached it is the only trust anchor: the sender is the token issuer, even
/// if the header is signed by a different key (an intermediate node, or the
/// session key itself). Without a session token the sender is the key of the
/// original body signature.
///
/// The bearer token is never consulted here.
pub fn resolve_owner<R>(envelope: &TokenEnvelope<'_, R>) -> Result<ResolvedIdentity, AclError> {
    let Some(header) = envelope.vheader else {
        return Err(AclError::EmptyVerificationHeader);
    };

    if let Some(token) = envelope.session {
        let (user_id, public_key) = token.verify()?;
        return Ok(ResolvedIdentity {
            user_id,
            public_key,
        });
    }

    let key = vheader::body_signature_key(Some(header))?;
    ResolvedIdentity::from_key(key, "invalid key in body signature")
}

/// What the request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget {
    pub container: ContainerId,
    /// Absent for container-wide operations (put, search).
    pub object: Option<ObjectId>,
    pub operation: Operation,
}

/// Decision context handed to the authorization gate.
///
/// Role and sender are fixed at construction; the only later change allowed
/// is dropping the bearer token.
pub struct RequestContext<'a, R> {
    basic_acl: BasicAcl,
    role: Role,
    operation: Operation,
    container_owner: UserId,
    container_id: ContainerId,
    object_id: Option<ObjectId>,
    sender: ResolvedIdentity,
    bearer: Option<&'a BearerToken>,
    request: &'a R,
}

impl<'a, R> RequestContext<'a, R> {
    /// Resolve the sender, classify it, and freeze the result.
    pub fn resolve(
        envelope: &TokenEnvelope<'a, R>,
        target: RequestTarget,
        container: &ContainerInfo,
        classifier: &RoleClassifier,
    ) -> Result<Self, AclError> {
        let sender = resolve_owner(envelope)?;
        let role = classifier.classify_role(
            &sender,
            &container.owner,
            container.basic_acl,
            target.operation,
        );

        Ok(Self {
            basic_acl: container.basic_acl,
            role,
            operation: target.operation,
            container_owner: container.owner,
            container_id: target.container,
            object_id: target.object,
            sender,
            bearer: envelope.bearer,
            request: envelope.request,
        })
    }

    pub fn basic_acl(&self) -> BasicAcl {
        self.basic_acl
    }

    pub fn request_role(&self) -> Role {
        self.role
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn container_owner(&self) -> &UserId {
        &self.container_owner
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.container_id
    }

    pub fn object_id(&self) -> Option<&ObjectId> {
        self.object_id.as_ref()
    }

    pub fn sender(&self) -> &ResolvedIdentity {
        &self.sender
    }

    pub fn sender_key(&self) -> &[u8] {
        self.sender.public_key()
    }

    pub fn bearer(&self) -> Option<&'a BearerToken> {
        self.bearer
    }

    /// Forget the bearer token, e.g. when the container forbids bearer rules.
    pub fn clean_bearer(&mut self) {
        self.bearer = None;
    }

    pub fn request(&self) -> &'a R {
        self.request
    }
}

impl<R> fmt::Debug for RequestContext<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("basic_acl", &self.basic_acl)
            .field("role", &self.role)
            .field("operation", &self.operation)
            .field("container_owner", &self.container_owner)
            .field("container_id", &self.container_id)
            .field("object_id", &self.object_id)
            .field("sender", &self.sender.user_id)
            .field("bearer", &self.bearer.is_some())
            .finish_non_exhaustive()
    }
}
