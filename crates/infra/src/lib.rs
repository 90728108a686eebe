//! # Yoyaku Notify インフラ層
//!
//! 外部コラボレーター（PostgreSQL、SMTP リレー）との接続・通信を担当する。
//!
//! ## 設計方針
//!
//! このクレートはドメイン層が定義する概念（予約レコード、メールメッセージ）の
//! 永続化・配送の具体実装を提供する。外部システムの詳細をカプセル化し、
//! ユースケース層はトレイト（[`repository::BookingRepository`]、
//! [`mailer::MailTransport`]）経由でのみ依存する。
//!
//! プロセスワイドなシングルトンは持たない。接続プールもトランスポートも
//! 起動時に明示的に構築され、依存として注入される。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理（[`db`]）
//! - **リポジトリ実装**: 予約レコードの挿入（[`repository`]）
//! - **メール送信**: SMTP リレーへのプール接続と送信・疎通確認（[`mailer`]）
//! - **エラー定義**: インフラ固有のエラー型（[`error`]）
//!
//! ## 依存関係
//!
//! ```text
//! notify → infra → domain
//! ```

pub mod db;
pub mod error;
pub mod mailer;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::InfraError;
