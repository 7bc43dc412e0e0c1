/*
 * Responsibility
 * - access check の request/response DTO
 * - validation (形式チェック) 用の validate() を持たせる
 * - 署名検証は services::acl 側の責務 (ここでは形だけ見る)
 */
use serde::{Deserialize, Serialize};

use crate::services::acl::types::b64;
use crate::services::acl::{
    BearerToken, ContainerId, ObjectId, Operation, RequestContext, RequestVerificationHeader,
    Role, SessionToken, UserId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessCheckRequest {
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    // Request body bytes covered by the body signature (base64).
    #[serde(with = "b64")]
    pub body: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_header: Option<RequestVerificationHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<SessionToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<BearerToken>,
}

impl AccessCheckRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.body.is_empty() {
            return Err("body is required");
        }

        // Operations on a single object must name it; put and search are container-wide.
        let needs_object = !matches!(self.operation, Operation::Put | Operation::Search);
        if needs_object && self.object_id.is_none() {
            return Err("object_id is required for this operation");
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessContextResponse {
    pub container_id: ContainerId,
    pub container_owner: UserId,
    pub basic_acl: String,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub role: Role,
    pub sender_id: UserId,
    pub sender_key: String,
    pub bearer_present: bool,
}

impl<R> From<&RequestContext<'_, R>> for AccessContextResponse {
    fn from(ctx: &RequestContext<'_, R>) -> Self {
        Self {
            container_id: *ctx.container_id(),
            container_owner: *ctx.container_owner(),
            basic_acl: ctx.basic_acl().to_string(),
            operation: ctx.operation(),
            object_id: ctx.object_id().copied(),
            role: ctx.request_role(),
            sender_id: *ctx.sender().user_id(),
            sender_key: hex::encode(ctx.sender_key()),
            bearer_present: ctx.bearer().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(operation: Operation, object_id: Option<ObjectId>) -> AccessCheckRequest {
        AccessCheckRequest {
            operation,
            object_id,
            body: b"body".to_vec(),
            verification_header: None,
            session_token: None,
            bearer_token: None,
        }
    }

    #[test]
    fn object_operations_need_object_id() {
        assert!(request(Operation::Put, None).validate().is_ok());
        assert!(request(Operation::Search, None).validate().is_ok());
        assert_eq!(
            request(Operation::Get, None).validate(),
            Err("object_id is required for this operation")
        );
        assert!(
            request(Operation::Delete, Some(ObjectId::from_bytes([1; 32])))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn empty_body_is_rejected() {
        let mut req = request(Operation::Put, None);
        req.body.clear();
        assert_eq!(req.validate(), Err("body is required"));
    }

    #[test]
    fn parses_minimal_json() {
        let req: AccessCheckRequest =
            serde_json::from_str(r#"{"operation":"put","body":"Ym9keQ=="}"#).unwrap();
        assert_eq!(req.operation, Operation::Put);
        assert_eq!(req.body, b"body");
        assert!(req.verification_header.is_none());
    }
}
