//! # Yoyaku Notify サービス
//!
//! 予約イベントを受け取り、検証・永続化し、メール通知を送信する HTTP
//! サービス。
//!
//! ## エンドポイント
//!
//! | メソッド | パス | 説明 |
//! |---------|------|------|
//! | POST | `/send-email` | 通知メールのみ送信（永続化なし） |
//! | POST | `/bookings` | 予約を保存してから通知メールを送信 |
//! | GET | `/health` | 稼働状態と DB 疎通の報告（常に 200） |
//!
//! ## レイヤー構成
//!
//! handler（HTTP の入出力） → usecase（検証・永続化・送信のオーケストレーション）
//! → yoyaku-infra（PostgreSQL / SMTP） → yoyaku-domain（純粋なモデルと検証）

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod usecase;
