//! `GET /health` ハンドラ
//!
//! プロセスが応答している限り常に 200 を返す。依存コラボレーターの失敗は
//! `checks` マップの値として報告し、HTTP ステータスには反映しない。

use std::{collections::HashMap, sync::Arc};

use axum::{Json, extract::State};
use chrono::Utc;
use yoyaku_shared::{CheckStatus, HealthResponse};

use crate::handler::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = match &state.db {
        Some(pool) if yoyaku_infra::db::ping(pool).await => CheckStatus::Ok,
        _ => CheckStatus::Error,
    };

    let mut checks = HashMap::new();
    checks.insert("database".to_string(), database);

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
        environment: state.environment.to_string(),
        checks,
    })
}
