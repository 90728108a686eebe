//! # 予約
//!
//! 予約送信のドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | 意味 |
//! |---|------|
//! | [`BookingRequest`] | クライアントから送信された未検証の予約ペイロード |
//! | [`BookingRecord`] | 検証・サニタイズ済みの予約レコード（永続化・通知の入力） |
//! | [`BookingId`] | サーバー採番の予約 ID（UUID v7） |
//!
//! ## 設計方針
//!
//! - **存在チェックのみのバリデーション**: 必須フィールドの有無を検査し、
//!   欠落フィールド名の一覧を返す。型変換は値を読むのに必要な範囲に留める
//! - **レコード構築時にサニタイズ**: [`BookingRequest::into_record`] が
//!   自由入力フィールドをすべて [`sanitize::strip_tags`] に通す。
//!   以降のパイプライン（永続化・メール構築）はサニタイズ済みの値だけを見る

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::DomainError, sanitize};

/// 添付ファイルのデコード後サイズ上限（5 MiB）
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// 予約 ID（一意識別子）
///
/// `bookings` テーブルの主キー。UUID v7 を使用し、挿入前にサーバー側で採番する。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, derive_more::Display,
)]
#[display("{_0}")]
pub struct BookingId(Uuid);

impl BookingId {
    /// 新しい ID を生成する（UUID v7）
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// 既存の UUID から ID を作成する
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 内部の UUID 参照を取得する
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

/// クライアントから送信された未検証の予約ペイロード
///
/// ワイヤ形式は camelCase の JSON。すべてのフィールドを `Option` で受け、
/// 欠落・null を区別せずに [`validate`](Self::validate) で検査する。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub order_id:         Option<String>,
    pub call_type:        Option<String>,
    pub start_time:       Option<String>,
    pub end_time:         Option<String>,
    /// 分単位の所要時間（正の数であること）
    pub duration:         Option<f64>,
    pub user_id:          Option<String>,
    /// 返信先としてのみ使用する任意フィールド
    pub user_email:       Option<String>,
    /// 価格（非負であること）
    pub price:            Option<f64>,
    pub order_status:     Option<String>,
    /// 却下理由。`order_status` が却下系のときのみ意味を持つ
    pub rejection_reason: Option<String>,
    /// base64 エンコードされた添付ファイル本体
    pub attachment:       Option<String>,
    pub attachment_name:  Option<String>,
    /// 添付ファイルの MIME タイプ（省略時は `application/octet-stream`）
    pub attachment_type:  Option<String>,
    /// クライアント指定の作成時刻（省略時はサーバー時刻）
    pub created:          Option<DateTime<Utc>>,
    pub confirmed:        Option<bool>,
}

impl BookingRequest {
    /// 必須フィールドの存在チェックを行う
    ///
    /// 欠落（未指定・null・空文字列）および不正値（`duration <= 0`、`price < 0`）の
    /// フィールド名をワイヤ形式（camelCase）で列挙して返す。副作用なし。
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut missing = Vec::new();

        if is_blank(&self.order_id) {
            missing.push("orderId");
        }
        if is_blank(&self.call_type) {
            missing.push("callType");
        }
        if is_blank(&self.start_time) {
            missing.push("startTime");
        }
        if is_blank(&self.end_time) {
            missing.push("endTime");
        }
        match self.duration {
            Some(d) if d > 0.0 => {}
            _ => missing.push("duration"),
        }
        if is_blank(&self.user_id) {
            missing.push("userId");
        }
        match self.price {
            Some(p) if p >= 0.0 => {}
            _ => missing.push("price"),
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(DomainError::MissingFields(missing))
        }
    }

    /// 添付ファイルのペア規則を満たしているか
    ///
    /// `attachment` と `attachment_name` の両方が存在するときだけ添付を使用する。
    /// 片方だけの場合は添付なしとして扱う（エラーにはしない）。
    pub fn has_attachment(&self) -> bool {
        !is_blank(&self.attachment) && !is_blank(&self.attachment_name)
    }

    /// 検証・サニタイズ済みの [`BookingRecord`] を構築する
    ///
    /// 自由入力フィールドはすべて [`sanitize::strip_tags`] に通す。
    /// `order_status` / `rejection_reason` はサニタイズ後に空となった場合 `None` に
    /// 正規化する（メール本文の条件付き行は非空のときだけ描画される）。
    ///
    /// `now` は `created` 未指定時のフォールバックとして使用する。
    pub fn into_record(self, now: DateTime<Utc>) -> Result<BookingRecord, DomainError> {
        self.validate()?;

        Ok(BookingRecord {
            id: BookingId::new(),
            order_id: strip_required(self.order_id),
            call_type: strip_required(self.call_type),
            start_time: strip_required(self.start_time),
            end_time: strip_required(self.end_time),
            duration_minutes: self.duration.unwrap_or_default(),
            user_id: strip_required(self.user_id),
            user_email: strip_optional(self.user_email),
            price: self.price.unwrap_or_default(),
            order_status: strip_optional(self.order_status),
            rejection_reason: strip_optional(self.rejection_reason),
            created: self.created.unwrap_or(now),
            confirmed: self.confirmed.unwrap_or(false),
        })
    }
}

/// 未指定・null・空白のみをまとめて「欠落」と判定する
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// 必須フィールドをサニタイズして取り出す
///
/// `validate()` 通過後にのみ呼ばれるため、`None` は空文字列に落ちる
/// （到達しないが、パニックはさせない）。
fn strip_required(value: Option<String>) -> String {
    sanitize::strip_tags(value.unwrap_or_default().trim())
}

/// 任意フィールドをサニタイズし、空なら `None` に正規化する
fn strip_optional(value: Option<String>) -> Option<String> {
    let stripped = sanitize::strip_tags(value?.trim());
    if stripped.trim().is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// 検証・サニタイズ済みの予約レコード
///
/// 永続化とメール構築の両方の入力となる。添付ファイル関連フィールドは
/// 永続化しないため、この型には含まれない（[`crate::notification::EmailAttachment`]
/// として通知メッセージ側で扱う）。
///
/// ライフサイクル: 受理されたリクエストごとに一度だけ生成され、
/// このコアからは更新も削除もされない。
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub id:               BookingId,
    pub order_id:         String,
    pub call_type:        String,
    pub start_time:       String,
    pub end_time:         String,
    pub duration_minutes: f64,
    pub user_id:          String,
    pub user_email:       Option<String>,
    pub price:            f64,
    pub order_status:     Option<String>,
    pub rejection_reason: Option<String>,
    pub created:          DateTime<Utc>,
    pub confirmed:        bool,
}
