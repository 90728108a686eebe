//! # ルーター構築
//!
//! ルート定義とレイヤー（CORS、トレース、レート制限）の組み立て。
//! テストから同じルーターを構築できるよう main から分離している。

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::RateLimitConfig,
    handler::{AppState, booking, email, health},
    middleware::{RateLimiter, rate_limit},
};

/// リクエストボディの上限
///
/// 添付ファイルはデコード後 5 MiB まで受理するため、base64 膨張と JSON の
/// 外装を含めて 10 MiB まで受け付ける。これを超える分は 413 で拒否される。
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// アプリケーションルーターを構築する
///
/// 許可オリジンが空の場合はすべてのオリジンを許可する（ローカル開発向け）。
/// レート制限は `/send-email` にのみ適用する。
pub fn build_router(
    state: Arc<AppState>,
    cors_allowed_origins: &[String],
    rate_limit_config: RateLimitConfig,
) -> Router {
    let cors = if cors_allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = cors_allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "CORS オリジンをパースできません（無視）");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    let limiter = Arc::new(RateLimiter::new(rate_limit_config));
    let email_routes = Router::new()
        .route("/send-email", post(email::send_email))
        .layer(axum::middleware::from_fn_with_state(limiter, rate_limit));

    Router::new()
        .route("/bookings", post(booking::create_booking))
        .route("/health", get(health::health_check))
        .merge(email_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
