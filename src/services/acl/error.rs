use std::fmt;

use super::keys::KeyError;
use super::types::Operation;

/// Which signed structure a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signed {
    RequestBody,
    SessionToken,
    BearerToken,
}

impl fmt::Display for Signed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RequestBody => "request body",
            Self::SessionToken => "session token",
            Self::BearerToken => "bearer token",
        })
    }
}

/// Identity resolution and token verification failures.
///
/// All of them are terminal for the request. The request handler decides
/// how to surface them; see [`AclError::is_malformed_request`].
#[derive(Debug, thiserror::Error)]
pub enum AclError {
    #[error("empty verification header")]
    EmptyVerificationHeader,
    #[error("empty body signature")]
    EmptyBodySignature,
    #[error("invalid {subject} signature")]
    InvalidSignature { subject: Signed },
    #[error("{context}: {source}")]
    MalformedKey {
        context: &'static str,
        #[source]
        source: KeyError,
    },
    #[error("session token is not issued by its signer")]
    InvalidSessionOwner,
    #[error("bearer token is not issued by its signer")]
    InvalidBearerIssuer,
    #[error("{token} is not valid at epoch {epoch}")]
    TokenExpired { token: Signed, epoch: u64 },
    #[error("request is not signed by the session key")]
    SessionKeyMismatch,
    #[error("session token verb mismatch: token allows {allowed}, request is {requested}")]
    SessionVerbMismatch {
        allowed: Operation,
        requested: Operation,
    },
    #[error("session token is bound to another container")]
    SessionContainerMismatch,
    #[error("session token does not cover the requested object")]
    SessionObjectMismatch,
    #[error("bearer token is bound to another container")]
    BearerContainerMismatch,
    #[error("bearer token is not issued by the container owner")]
    BearerIssuerNotOwner,
    #[error("bearer token is bound to another user")]
    BearerUserMismatch,
}

impl AclError {
    pub(crate) fn malformed_key(context: &'static str, source: KeyError) -> Self {
        Self::MalformedKey { context, source }
    }

    /// True when the request itself is structurally broken (as opposed to
    /// well-formed but not authorized).
    pub fn is_malformed_request(&self) -> bool {
        matches!(
            self,
            Self::EmptyVerificationHeader | Self::EmptyBodySignature | Self::MalformedKey { .. }
        )
    }
}
