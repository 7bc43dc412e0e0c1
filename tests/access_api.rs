use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use ed25519_dalek::SigningKey;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use object_acl::api::v1::dto::AccessCheckRequest;
use object_acl::app::build_router;
use object_acl::services::acl::{
    BasicAcl, BearerToken, ContainerId, ContainerInfo, FixedEpoch, InMemoryContainers, Lifetime,
    ObjectId, Operation, RequestVerificationHeader, RoleClassifier, SessionToken, UserId,
    token::{BearerBody, SessionBody, SessionContext},
};
use object_acl::state::AppState;

const EPOCH: u64 = 10;
const BODY: &[u8] = b"object payload";

fn key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

fn uid(key: &SigningKey) -> UserId {
    UserId::from_public_key(key.verifying_key().as_bytes()).unwrap()
}

fn container() -> ContainerId {
    ContainerId::from_bytes([7; 32])
}

fn owner() -> SigningKey {
    key(1)
}

fn system_node() -> SigningKey {
    key(9)
}

fn app() -> Router {
    let containers = InMemoryContainers::new().with(
        container(),
        ContainerInfo {
            owner: uid(&owner()),
            basic_acl: BasicAcl::from_bits(0x1fbf_8fff),
        },
    );
    let classifier =
        RoleClassifier::new([system_node().verifying_key().to_bytes().to_vec()]).unwrap();

    build_router(AppState::new(
        Arc::new(containers),
        Arc::new(classifier),
        Arc::new(FixedEpoch(EPOCH)),
    ))
}

fn signed_put(signer: &SigningKey) -> AccessCheckRequest {
    AccessCheckRequest {
        operation: Operation::Put,
        object_id: None,
        body: BODY.to_vec(),
        verification_header: Some(RequestVerificationHeader::signed(signer, BODY)),
        session_token: None,
        bearer_token: None,
    }
}

fn lifetime(exp: u64) -> Lifetime {
    Lifetime {
        iat: 0,
        nbf: 0,
        exp,
    }
}

fn session(issuer: &SigningKey, holder: &SigningKey, exp: u64) -> SessionToken {
    let mut token = SessionToken::new(SessionBody {
        id: Uuid::new_v4(),
        issuer: uid(issuer),
        lifetime: lifetime(exp),
        session_key: holder.verifying_key().to_bytes().to_vec(),
        context: SessionContext {
            verb: Operation::Put,
            container: container(),
            objects: Vec::new(),
        },
    });
    token.sign(issuer);
    token
}

fn bearer(issuer: &SigningKey) -> BearerToken {
    let mut token = BearerToken::new(BearerBody {
        issuer: uid(issuer),
        container: Some(container()),
        assert_user: None,
        lifetime: lifetime(100),
    });
    token.sign(issuer);
    token
}

async fn post(container_id: &str, req: &AccessCheckRequest) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/containers/{container_id}/access"))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(req).unwrap()))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn check(req: &AccessCheckRequest) -> (StatusCode, Value) {
    post(&container().to_string(), req).await
}

#[tokio::test]
async fn health_is_ok_and_tagged_with_request_id() {
    let request = Request::builder()
        .uri("/api/v1/health")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn owner_request_resolves_to_owner() {
    let (status, body) = check(&signed_put(&owner())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");
    assert_eq!(body["sender_id"], uid(&owner()).to_string());
    assert_eq!(body["container_owner"], uid(&owner()).to_string());
    assert_eq!(body["operation"], "put");
    assert_eq!(body["bearer_present"], false);
}

#[tokio::test]
async fn stranger_is_other_and_system_node_is_container_system() {
    let (status, body) = check(&signed_put(&key(5))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "other");

    let (status, body) = check(&signed_put(&system_node())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "container_system");
}

#[tokio::test]
async fn session_issuer_wins_over_request_signer() {
    let holder = key(2);
    let mut req = signed_put(&holder);
    req.session_token = Some(session(&owner(), &holder, 100));

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");
    assert_eq!(body["sender_id"], uid(&owner()).to_string());
    assert_eq!(
        body["sender_key"],
        hex::encode(owner().verifying_key().as_bytes()),
        "sender key must be the session issuer's"
    );
}

#[tokio::test]
async fn forwarded_request_keeps_original_signer() {
    let mut req = signed_put(&owner());
    req.verification_header = req
        .verification_header
        .map(|header| header.forward(&key(3), b"meta"));

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");
    assert_eq!(body["sender_id"], uid(&owner()).to_string());
}

#[tokio::test]
async fn missing_header_is_malformed() {
    let mut req = signed_put(&owner());
    req.verification_header = None;

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_REQUEST");
}

#[tokio::test]
async fn missing_header_is_malformed_even_with_session() {
    let holder = key(2);
    let mut req = signed_put(&holder);
    req.verification_header = None;
    req.session_token = Some(session(&owner(), &holder, 100));

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_REQUEST");
}

#[tokio::test]
async fn tampered_body_is_denied() {
    let mut req = signed_put(&owner());
    req.body = b"other payload".to_vec();

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
}

#[tokio::test]
async fn expired_session_is_denied() {
    let holder = key(2);
    let mut req = signed_put(&holder);
    req.session_token = Some(session(&owner(), &holder, EPOCH - 1));

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
}

#[tokio::test]
async fn session_presented_by_another_key_is_denied() {
    let holder = key(2);
    let mut req = signed_put(&key(66));
    req.session_token = Some(session(&owner(), &holder, 100));

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
    assert_eq!(
        body["error"]["message"],
        "request is not signed by the session key"
    );
}

#[tokio::test]
async fn forged_session_reports_signature_before_context() {
    let holder = key(2);
    let mut token = session(&owner(), &holder, 100);
    token.body.context.verb = Operation::Delete;
    let mut req = signed_put(&holder);
    req.session_token = Some(token);

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["message"], "invalid session token signature");
}

#[tokio::test]
async fn bearer_is_reported_but_does_not_change_sender() {
    let mut req = signed_put(&key(5));
    req.bearer_token = Some(bearer(&owner()));

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "other");
    assert_eq!(body["sender_id"], uid(&key(5)).to_string());
    assert_eq!(body["bearer_present"], true);
}

#[tokio::test]
async fn bearer_from_non_owner_is_denied() {
    let mut req = signed_put(&key(5));
    req.bearer_token = Some(bearer(&key(6)));

    let (status, body) = check(&req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
}

#[tokio::test]
async fn unknown_container_is_not_found() {
    let (status, body) = post(
        &ContainerId::from_bytes([8; 32]).to_string(),
        &signed_put(&owner()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn bad_container_id_is_rejected() {
    let (status, body) = post("not-hex", &signed_put(&owner())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_CONTAINER_ID");
}

#[tokio::test]
async fn object_operation_without_object_id_is_rejected() {
    let mut req = signed_put(&owner());
    req.operation = Operation::Get;

    let (status, body) = check(&req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    req.object_id = Some(ObjectId::from_bytes([4; 32]));
    let (status, body) = check(&req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object_id"], ObjectId::from_bytes([4; 32]).to_string());
}
