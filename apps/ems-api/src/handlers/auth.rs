//! 导出口令校验
//!
//! - POST /api/v1/auth/verify-export-password

use crate::AppState;
use crate::utils::response::{bad_request_error, internal_error};
use api_contract::{ApiResponse, VerifyPasswordRequest, VerifyPasswordResponse};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

pub async fn verify_export_password(
    State(state): State<AppState>,
    Json(req): Json<VerifyPasswordRequest>,
) -> Response {
    if req.password.is_empty() {
        return bad_request_error("password is required");
    }
    let Some(expected) = state.export_password.as_deref() else {
        tracing::error!("EMS_ADMIN_EXPORT_PASSWORD is not configured");
        return internal_error("INTERNAL.CONFIG", "server configuration error");
    };
    if password_matches(&req.password, expected) {
        (
            StatusCode::OK,
            Json(ApiResponse::success(VerifyPasswordResponse { verified: true })),
        )
            .into_response()
    } else {
        tracing::warn!("export password rejected");
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error("AUTH.INVALID_PASSWORD", "invalid password")),
        )
            .into_response()
    }
}

/// 常量时间比较，避免通过响应耗时推断口令。
fn password_matches(candidate: &str, expected: &str) -> bool {
    bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}
