/*
 * Responsibility
 *  - Path の String を hex の ContainerId として受け取る
 *  - 失敗時は AppError::bad_request (400) へ変換
 */
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::AppError;
use crate::services::acl::ContainerId;
use crate::state::AppState;

#[derive(Clone, Copy, Debug)]
pub struct ContainerIdPath(pub ContainerId);

fn decode_or_bad_request(raw: &str) -> Result<ContainerId, AppError> {
    raw.parse::<ContainerId>()
        .map_err(|e| AppError::bad_request("INVALID_CONTAINER_ID", e.to_string()))
}

impl FromRequestParts<AppState> for ContainerIdPath {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("INVALID_CONTAINER_ID", "missing container id"))?;
        let id = decode_or_bad_request(&raw)?;
        Ok(Self(id))
    }
}
