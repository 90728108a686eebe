//! # ヘルスチェック共通型
//!
//! ヘルスチェックエンドポイントのレスポンス型を提供する。
//!
//! プロセスが生きている限り常に 200 を返す設計のため、個別チェックの失敗は
//! `checks` マップの値（[`CheckStatus::Error`]）として表現し、
//! HTTP ステータスには反映しない。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 個別チェックの結果ステータス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// チェック成功
    Ok,
    /// チェック失敗
    Error,
}

/// ヘルスチェックレスポンス
///
/// プロセスの稼働状態と依存コラボレーターへの疎通状態を示す。
///
/// ## 使用例
///
/// ```
/// use std::collections::HashMap;
///
/// use yoyaku_shared::{CheckStatus, HealthResponse};
///
/// let mut checks = HashMap::new();
/// checks.insert("database".to_string(), CheckStatus::Ok);
/// let response = HealthResponse {
///     status: "healthy".to_string(),
///     version: "0.1.0".to_string(),
///     uptime_secs: 42,
///     timestamp: chrono::Utc::now(),
///     environment: "development".to_string(),
///     checks,
/// };
/// assert_eq!(response.status, "healthy");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// 稼働状態（プロセスが応答している限り `"healthy"`）
    pub status:      String,
    /// アプリケーションバージョン（Cargo.toml から取得）
    pub version:     String,
    /// プロセス起動からの経過秒数
    pub uptime_secs: u64,
    /// レスポンス生成時刻（RFC 3339）
    pub timestamp:   DateTime<Utc>,
    /// デプロイメントモード（`"production"` / `"development"`）
    pub environment: String,
    /// 個別チェック結果（キー: チェック名、値: ステータス）
    pub checks:      HashMap<String, CheckStatus>,
}
