//! # Yoyaku Notify ドメイン層
//!
//! 予約通知のドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **I/O 非依存**: このクレートはデータベースにもメールリレーにも依存しない。
//!   バリデーション・サニタイズはすべて純粋関数として表現する
//! - **信頼境界の明示**: [`booking::BookingRequest`]（未検証の入力）と
//!   [`booking::BookingRecord`]（検証済み・永続化対象）を型で区別する
//! - **ドメインエラー**: ビジネスルール違反は [`DomainError`] で表現し、
//!   API 層が 400 にマップする
//!
//! ## 依存関係の方向
//!
//! ```text
//! notify → infra → domain
//!      ↘     ↓
//!        shared
//! ```
//!
//! ドメイン層は他のどのレイヤーにも依存しない。

pub mod booking;
pub mod error;
pub mod notification;
pub mod sanitize;

pub use error::DomainError;
