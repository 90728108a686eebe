//! # ミドルウェア
//!
//! `/send-email` に適用するクライアント IP 単位の固定ウィンドウレート制限。
//!
//! ## 設計方針
//!
//! - **固定ウィンドウ**: IP ごとに（ウィンドウ開始時刻, カウント）を保持し、
//!   ウィンドウ経過後の最初のリクエストでリセットする
//! - **プロセス内**: 単一プロセス運用を前提とし、外部ストアは使わない。
//!   二度と現れない IP のバケットが残り続けないよう、ウィンドウ 1 回分が
//!   経過するごとに期限切れバケットをまとめて回収する

use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::config::RateLimitConfig;

/// クライアント IP 単位の固定ウィンドウレートリミッタ
pub struct RateLimiter {
    window: Duration,
    max:    u32,
    state:  Mutex<BucketState>,
}

struct BucketState {
    last_sweep: Instant,
    buckets:    HashMap<IpAddr, (Instant, u32)>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            window: config.window,
            max:    config.max_requests,
            state:  Mutex::new(BucketState {
                last_sweep: Instant::now(),
                buckets:    HashMap::new(),
            }),
        }
    }

    /// リクエスト 1 件分の枠を確保する。枠がなければ `false`
    pub fn try_acquire(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        // 期限切れバケットの一括回収。ウィンドウ 1 回分ごとに行うため、
        // 回収コストはリクエスト数に対して償却される
        if now.duration_since(state.last_sweep) >= self.window {
            let window = self.window;
            state
                .buckets
                .retain(|_, (started, _)| now.duration_since(*started) < window);
            state.last_sweep = now;
        }

        let (started, count) = state.buckets.entry(ip).or_insert((now, 0));
        if now.duration_since(*started) >= self.window {
            *started = now;
            *count = 0;
        }
        if *count >= self.max {
            return false;
        }
        *count += 1;
        true
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .buckets
            .len()
    }
}

/// レート制限ミドルウェア
///
/// 接続情報が取れない場合（テスト構成など）は単一バケットに落とす。
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if !limiter.try_acquire(ip) {
        tracing::warn!(%ip, "レート制限を超過しました");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "success": false,
                "error": "Too many requests from this IP, please try again later",
            })),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window: Duration::from_secs(900),
            max_requests,
        })
    }

    #[test]
    fn 上限までは許可しそれ以降は拒否する() {
        let limiter = limiter(3);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        assert!(limiter.try_acquire(ip));
        assert!(limiter.try_acquire(ip));
        assert!(limiter.try_acquire(ip));
        assert!(!limiter.try_acquire(ip));
    }

    #[test]
    fn ipごとに独立してカウントする() {
        let limiter = limiter(1);
        let first = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let second = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(limiter.try_acquire(first));
        assert!(!limiter.try_acquire(first));
        assert!(limiter.try_acquire(second));
    }

    #[test]
    fn ウィンドウ経過でカウントがリセットされる() {
        let limiter = RateLimiter::new(RateLimitConfig {
            window:       Duration::ZERO,
            max_requests: 1,
        });
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        assert!(limiter.try_acquire(ip));
        // ウィンドウ幅 0 なので次のリクエストで即リセットされる
        assert!(limiter.try_acquire(ip));
    }

    #[test]
    fn 期限切れバケットは回収されマップが無限に育たない() {
        let limiter = RateLimiter::new(RateLimitConfig {
            window:       Duration::ZERO,
            max_requests: 1,
        });

        for i in 0..10_000u32 {
            let octets = i.to_be_bytes();
            let ip = IpAddr::V4(Ipv4Addr::new(10, octets[1], octets[2], octets[3]));
            assert!(limiter.try_acquire(ip));
        }

        // ウィンドウ幅 0 ではすべてのバケットが即期限切れになるため、
        // 残るのは直近のリクエスト分だけ
        assert!(limiter.bucket_count() <= 1);
    }
}
