//! Access-control decision layer of the object service.
//!
//! Core-only: nothing here knows about HTTP or storage backends. The request
//! path is
//!
//! 1. `vheader` / `token`: extract and verify the trust material,
//! 2. `request::resolve_owner`: pick the single authoritative sender,
//! 3. `classify::RoleClassifier`: map the sender to a role for the container,
//! 4. `request::RequestContext`: freeze the result for the authorization gate.

pub mod classify;
pub mod container;
pub mod epoch;
pub mod error;
pub mod keys;
pub mod request;
pub mod token;
pub mod types;
pub mod vheader;

pub use classify::RoleClassifier;
pub use container::{ContainerError, ContainerInfo, ContainerSource, InMemoryContainers};
pub use epoch::{ClockEpoch, EpochSource, FixedEpoch};
pub use error::{AclError, Signed};
pub use keys::KeyError;
pub use request::{RequestContext, RequestTarget, ResolvedIdentity, TokenEnvelope, resolve_owner};
pub use token::{BearerToken, Lifetime, SessionToken, verify_bearer};
pub use types::{
    BasicAcl, ContainerId, ObjectId, Operation, RequestVerificationHeader, Role, Signature, UserId,
};
