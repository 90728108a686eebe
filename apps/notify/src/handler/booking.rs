//! `POST /bookings` ハンドラ

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use yoyaku_domain::booking::{BookingId, BookingRequest};

use crate::{
    error::{ApiError, ApiJson},
    handler::AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub success:    bool,
    pub message:    &'static str,
    pub booking_id: BookingId,
    pub email_id:   String,
}

/// 予約を保存し、通知メールを送信する
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<BookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (booking_id, email_id) = state
        .dispatcher
        .create_booking(request)
        .await
        .map_err(|e| ApiError::new(e, state.environment))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            success: true,
            message: "Booking created successfully",
            booking_id,
            email_id,
        }),
    ))
}
