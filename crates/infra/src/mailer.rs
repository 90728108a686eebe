//! # メール送信チャネル
//!
//! 外部メールリレーへの送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`MailTransport`] trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（本番・開発）、Noop（テスト・通知無効化時）
//! - **疎通確認の分離**: リレーのヘルスチェックはリクエスト処理から独立した
//!   バックグラウンドループ（[`spawn_verification_loop`]）が行う。
//!   リクエスト経路の送信失敗は自動リトライせず、即座に呼び出し元へ返す

mod noop;
mod smtp;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
pub use noop::NoopMailer;
pub use smtp::{SmtpMailer, SmtpMailerConfig};
use tokio::task::JoinHandle;
use yoyaku_domain::notification::{EmailMessage, NotificationError};

/// 疎通確認失敗時の再試行遅延（固定 5 秒）
pub const VERIFY_RETRY_DELAY: Duration = Duration::from_secs(5);

/// 疎通確認成功時の次回確認までの間隔
pub const VERIFY_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// メール送信トレイト
///
/// 配送チャネルの中核。送信と疎通確認を抽象化し、
/// ユースケース層はこの trait 経由でのみリレーに触れる。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// メールを送信し、リレーに渡したメッセージ ID を返す
    ///
    /// タイムアウトは持たない。呼び出し側（ディスパッチャ）が
    /// `tokio::time::timeout` で期限を課す。
    async fn send(&self, email: &EmailMessage) -> Result<String, NotificationError>;

    /// リレーの認証情報と到達性を確認する
    async fn verify(&self) -> Result<(), NotificationError>;
}

/// リレー疎通確認のバックグラウンドループを起動する
///
/// 起動直後に一度確認し、以降は失敗時 `retry_delay`（通常 5 秒）、
/// 成功時 `check_interval` の間隔で無限に繰り返す。失敗してもログを出すだけで
/// プロセスは落とさず、リクエスト処理もブロックしない。
///
/// 返り値の [`JoinHandle`] をシャットダウン時に `abort()` することで停止する。
pub fn spawn_verification_loop(
    mailer: Arc<dyn MailTransport>,
    retry_delay: Duration,
    check_interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match mailer.verify().await {
                Ok(()) => {
                    tracing::info!("メールリレーの疎通を確認しました");
                    tokio::time::sleep(check_interval).await;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        retry_after_secs = retry_delay.as_secs(),
                        "メールリレーの疎通確認に失敗しました。再試行します"
                    );
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMailTransport;

    #[tokio::test(start_paused = true)]
    async fn 疎通確認は失敗のたびに5秒後へ再スケジュールされる() {
        let mailer = MockMailTransport::new();
        mailer.fail_next_verifies(3);

        let handle = spawn_verification_loop(
            Arc::new(mailer.clone()),
            Duration::from_secs(5),
            Duration::from_secs(60),
        );

        // 失敗 3 回（0s, 5s, 10s）＋成功 1 回（15s）まで進める
        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(mailer.verify_calls(), 4);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn 成功後は長い間隔で再確認する() {
        let mailer = MockMailTransport::new();

        let handle = spawn_verification_loop(
            Arc::new(mailer.clone()),
            Duration::from_secs(5),
            Duration::from_secs(60),
        );

        tokio::time::sleep(Duration::from_secs(61)).await;
        // 0s と 60s の 2 回
        assert_eq!(mailer.verify_calls(), 2);

        handle.abort();
    }

    #[tokio::test]
    async fn abortでループが停止する() {
        let mailer = MockMailTransport::new();
        let handle = spawn_verification_loop(
            Arc::new(mailer),
            Duration::from_secs(5),
            Duration::from_secs(60),
        );

        handle.abort();
        let joined = handle.await;
        assert!(joined.unwrap_err().is_cancelled());
    }
}
