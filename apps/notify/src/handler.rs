//! # HTTP ハンドラ
//!
//! axum のルートハンドラと共有状態を定義する。ハンドラはリクエスト DTO の
//! 受け取りとレスポンス整形だけを担い、ロジックはユースケース層に委譲する。

pub mod booking;
pub mod email;
pub mod health;

use std::time::Instant;

use sqlx::PgPool;

use crate::{config::Environment, usecase::Dispatcher};

/// 全ハンドラで共有するアプリケーション状態
///
/// `db` はヘルスチェックの疎通確認にのみ使用する。モック構成のテストでは
/// `None` とし、データベースチェックは常に失敗として報告される。
pub struct AppState {
    pub dispatcher:  Dispatcher,
    pub environment: Environment,
    pub db:          Option<PgPool>,
    pub started_at:  Instant,
}
