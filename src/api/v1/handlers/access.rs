/*
 * Responsibility
 * - POST /containers/{container_id}/access handler
 * - DTO validation → container lookup → services::acl の pipeline 呼び出し
 * - permit/deny はしない: 決定コンテキスト (role, sender) を返すだけ
 */
use axum::{Json, extract::State};
use tracing::{debug, warn};

use crate::{
    api::v1::{
        dto::{AccessCheckRequest, AccessContextResponse},
        extractors::ContainerIdPath,
    },
    error::AppError,
    services::acl::{
        AclError, ContainerInfo, RequestContext, RequestTarget, TokenEnvelope, verify_bearer,
        vheader,
    },
    state::AppState,
};

pub async fn check_access(
    State(state): State<AppState>,
    ContainerIdPath(container_id): ContainerIdPath,
    Json(req): Json<AccessCheckRequest>,
) -> Result<Json<AccessContextResponse>, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("BAD_REQUEST", msg))?;

    let container = state.containers.get(&container_id).await?;

    let target = RequestTarget {
        container: container_id,
        object: req.object_id,
        operation: req.operation,
    };
    let epoch = state.epochs.current_epoch();

    let ctx = resolve_context(&state, &req, target, &container, epoch).inspect_err(|err| {
        warn!(
            error = %err,
            container = %container_id,
            operation = %req.operation,
            epoch,
            "access check rejected"
        );
    })?;

    debug!(
        container = %container_id,
        sender = %ctx.sender().user_id(),
        role = %ctx.request_role(),
        "access context resolved"
    );

    Ok(Json(AccessContextResponse::from(&ctx)))
}

fn resolve_context<'a>(
    state: &AppState,
    req: &'a AccessCheckRequest,
    target: RequestTarget,
    container: &ContainerInfo,
    epoch: u64,
) -> Result<RequestContext<'a, AccessCheckRequest>, AclError> {
    vheader::verify_body_signature(&req.body, req.verification_header.as_ref())?;

    let envelope = TokenEnvelope::new(req)
        .with_verification_header(req.verification_header.as_ref())
        .with_session_token(req.session_token.as_ref())
        .with_bearer_token(req.bearer_token.as_ref());

    // session signature is checked here, before its contents are trusted
    let ctx = RequestContext::resolve(&envelope, target, container, &state.classifier)?;

    if let Some(session) = &req.session_token {
        let holder_key = vheader::body_signature_key(req.verification_header.as_ref())?;
        session.validate_for(
            holder_key,
            target.operation,
            &target.container,
            target.object.as_ref(),
            epoch,
        )?;
    }

    if let Some(bearer) = ctx.bearer() {
        verify_bearer(
            bearer,
            &target.container,
            &container.owner,
            ctx.sender().user_id(),
            epoch,
        )?;
    }

    Ok(ctx)
}
