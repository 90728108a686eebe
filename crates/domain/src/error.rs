//! # ドメイン層エラー定義
//!
//! 入力検証の失敗など、クライアント起因の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `MissingFields` | 400 Bad Request | 必須フィールドの欠落・不正値 |
//! | `AttachmentTooLarge` | 400 Bad Request | 添付ファイルのサイズ超過 |
//! | `InvalidAttachment` | 400 Bad Request | base64 デコード失敗 |
//!
//! いずれもクライアント起因であり、詳細を隠す必要はない（本番でも平文で返す）。

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// すべてクライアント入力の問題を表す。サーバー側の障害
/// （ストア到達不能、リレー障害）はインフラ層のエラー型が担う。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// 必須フィールドの欠落または不正な値
    ///
    /// 欠落・不正と判定されたフィールド名の一覧を保持する。
    /// フィールド名はワイヤ形式（camelCase）で報告する。
    #[error("必須フィールドが不足しています: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// 添付ファイルのサイズ超過（デコード後 5 MiB 超）
    #[error("添付ファイルが大きすぎます: {size} バイト（上限 {limit} バイト）")]
    AttachmentTooLarge {
        /// デコード後のバイト数
        size:  usize,
        /// 上限バイト数
        limit: usize,
    },

    /// 添付ファイルの base64 デコード失敗
    #[error("添付ファイルのデコードに失敗しました: {0}")]
    InvalidAttachment(String),
}
