//! Noop 送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! 通知を無効化した環境やローカル動作確認で使用する。

use async_trait::async_trait;
use uuid::Uuid;
use yoyaku_domain::notification::{EmailMessage, NotificationError};

use super::MailTransport;

/// Noop 送信チャネル（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopMailer;

#[async_trait]
impl MailTransport for NoopMailer {
    async fn send(&self, email: &EmailMessage) -> Result<String, NotificationError> {
        let message_id = format!("<{}@yoyaku-notify>", Uuid::new_v4());
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            message_id = %message_id,
            "Noop: メール送信をスキップ"
        );
        Ok(message_id)
    }

    async fn verify(&self) -> Result<(), NotificationError> {
        Ok(())
    }
}
