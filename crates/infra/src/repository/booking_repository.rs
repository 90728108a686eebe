//! # BookingRepository
//!
//! 予約レコードの永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **挿入のみ**: 受理された予約ごとに 1 行を追加する。更新・削除・読み取りは
//!   このコアの関心外
//! - **原子性**: 単一 INSERT のため部分書き込みは発生しない。ストア到達不能は
//!   `InfraError::Database` として呼び出し元に浮上する
//! - **orderId の一意性制約なし**: 同じ orderId の再送は重複行を生む（現行仕様）。
//!   真の冪等性が必要になった場合は `order_id` への UNIQUE 制約を追加する

use async_trait::async_trait;
use sqlx::PgPool;
use yoyaku_domain::booking::BookingRecord;

use crate::error::InfraError;

/// 予約リポジトリトレイト
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// 予約レコードを 1 行挿入する
    ///
    /// ID はドメイン層で採番済み。成功時は何も返さず、
    /// 呼び出し元はレコードが持つ ID をレスポンスに使用する。
    async fn insert(&self, record: &BookingRecord) -> Result<(), InfraError>;
}

/// PostgreSQL 実装の BookingRepository
#[derive(Debug, Clone)]
pub struct PostgresBookingRepository {
    pool: PgPool,
}

impl PostgresBookingRepository {
    /// 新しいリポジトリインスタンスを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PostgresBookingRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(order_id = %record.order_id))]
    async fn insert(&self, record: &BookingRecord) -> Result<(), InfraError> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, order_id, call_type, start_time, end_time,
                duration_minutes, user_id, user_email, price,
                order_status, rejection_reason, created, confirmed
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.order_id)
        .bind(&record.call_type)
        .bind(&record.start_time)
        .bind(&record.end_time)
        .bind(record.duration_minutes)
        .bind(&record.user_id)
        .bind(&record.user_email)
        .bind(record.price)
        .bind(&record.order_status)
        .bind(&record.rejection_reason)
        .bind(record.created)
        .bind(record.confirmed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
