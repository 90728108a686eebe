//! # API エラー定義
//!
//! ユースケース層のエラーを HTTP レスポンスに変換する。
//!
//! ## 分類と秘匿
//!
//! | 種別 | ステータス | 詳細の扱い |
//! |------|-----------|-----------|
//! | バリデーション・添付サイズ超過 | 400 | 常に平文（クライアント起因で安全） |
//! | ストア障害 | 500 | 本番では秘匿 |
//! | リレー障害・送信タイムアウト | 500 | 本番では秘匿 |
//!
//! 本番ではストア障害・リレー障害・タイムアウトがすべて同じ汎用メッセージに
//! 潰れるため、クライアントは「入力を直す」（400）か「後で再送する」（500）
//! かだけを判別できる。

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use yoyaku_domain::DomainError;

use crate::{config::Environment, usecase::DispatchError};

/// 本番で 500 の詳細を置き換える汎用メッセージ
const REDACTED_DETAIL: &str = "Internal server error";

/// HTTP レスポンスへの変換を担う API エラー
///
/// 秘匿の要否は生成時点のデプロイメントモードで決まる。
#[derive(Debug)]
pub struct ApiError {
    kind:   DispatchError,
    redact: bool,
}

impl ApiError {
    /// ユースケースエラーを API エラーに変換する
    pub fn new(kind: DispatchError, environment: Environment) -> Self {
        Self {
            kind,
            redact: environment.is_production(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.kind {
            DispatchError::Invalid(DomainError::MissingFields(fields)) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Missing required fields",
                    "fields": fields,
                })),
            )
                .into_response(),
            DispatchError::Invalid(DomainError::AttachmentTooLarge { .. }) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Attachment too large (max 5MB)",
                })),
            )
                .into_response(),
            DispatchError::Invalid(DomainError::InvalidAttachment(_)) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "Invalid attachment encoding",
                })),
            )
                .into_response(),
            DispatchError::Storage(e) => {
                tracing::error!(
                    error = %e,
                    span_trace = %e.span_trace(),
                    "予約の保存に失敗しました"
                );
                let detail = if self.redact {
                    REDACTED_DETAIL.to_string()
                } else {
                    e.to_string()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "message": "Failed to process booking",
                        "error": detail,
                    })),
                )
                    .into_response()
            }
            DispatchError::Delivery(e) => {
                tracing::error!(error = %e, "通知メールの送信に失敗しました");
                let detail = if self.redact {
                    REDACTED_DETAIL.to_string()
                } else {
                    e.to_string()
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "message": "Failed to send email",
                        "error": detail,
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// `Json` 抽出器のラッパー
///
/// 構文エラー・型不一致のペイロードでも axum 既定の平文レスポンスではなく、
/// 他のクライアント起因エラーと同じ `{success:false, error}` のエンベロープで
/// 400 を返す。
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": rejection.body_text(),
                })),
            )
                .into_response()),
        }
    }
}
