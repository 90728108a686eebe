//! `POST /send-email` ハンドラ

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use yoyaku_domain::booking::BookingRequest;

use crate::{
    error::{ApiError, ApiJson},
    handler::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub success:  bool,
    pub message:  &'static str,
    pub email_id: String,
}

/// 予約内容の通知メールを送信する（永続化なし）
pub async fn send_email(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<BookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email_id = state
        .dispatcher
        .dispatch_email(request)
        .await
        .map_err(|e| ApiError::new(e, state.environment))?;

    Ok((
        StatusCode::OK,
        Json(SendEmailResponse {
            success: true,
            message: "Email sent successfully",
            email_id,
        }),
    ))
}
