//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリのモックコラボレーター。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! yoyaku-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use uuid::Uuid;
use yoyaku_domain::{
    booking::BookingRecord,
    notification::{EmailMessage, NotificationError},
};

use crate::{error::InfraError, mailer::MailTransport, repository::BookingRepository};

// ===== MockBookingRepository =====

/// インメモリの予約リポジトリ
///
/// 挿入されたレコードを保持し、テストから検査できる。
/// `fail_inserts(true)` でストア到達不能を模擬する。
#[derive(Clone, Default)]
pub struct MockBookingRepository {
    records:      Arc<Mutex<Vec<BookingRecord>>>,
    fail_inserts: Arc<Mutex<bool>>,
}

impl MockBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以降の挿入を失敗させる（ストア到達不能の模擬）
    pub fn fail_inserts(&self, fail: bool) {
        *self.fail_inserts.lock().unwrap() = fail;
    }

    /// 挿入済みレコードのスナップショットを取得する
    pub fn records(&self) -> Vec<BookingRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingRepository for MockBookingRepository {
    async fn insert(&self, record: &BookingRecord) -> Result<(), InfraError> {
        if *self.fail_inserts.lock().unwrap() {
            return Err(InfraError::unexpected("ストアに到達できません"));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ===== MockMailTransport =====

/// 送信の挙動モード
#[derive(Debug, Clone)]
enum SendBehavior {
    /// 即時成功
    Succeed,
    /// 即時失敗
    Fail(String),
    /// 指定時間スリープしてから成功（応答しないリレーの模擬）
    Hang(Duration),
}

/// インメモリのメール送信チャネル
///
/// 送信されたメッセージを記録し、テストから検査できる。
/// 失敗・遅延（ハング）の挙動を切り替えられる。
#[derive(Clone)]
pub struct MockMailTransport {
    behavior:              Arc<Mutex<SendBehavior>>,
    sent:                  Arc<Mutex<Vec<EmailMessage>>>,
    verify_calls:          Arc<Mutex<u32>>,
    verify_failures_left:  Arc<Mutex<u32>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self {
            behavior:             Arc::new(Mutex::new(SendBehavior::Succeed)),
            sent:                 Arc::new(Mutex::new(Vec::new())),
            verify_calls:         Arc::new(Mutex::new(0)),
            verify_failures_left: Arc::new(Mutex::new(0)),
        }
    }

    /// 以降の送信を失敗させる
    pub fn fail_sends(&self, message: impl Into<String>) {
        *self.behavior.lock().unwrap() = SendBehavior::Fail(message.into());
    }

    /// 以降の送信を指定時間ハングさせる（その後成功する）
    pub fn hang_sends(&self, delay: Duration) {
        *self.behavior.lock().unwrap() = SendBehavior::Hang(delay);
    }

    /// 次の `n` 回の疎通確認を失敗させる
    pub fn fail_next_verifies(&self, n: u32) {
        *self.verify_failures_left.lock().unwrap() = n;
    }

    /// 疎通確認の呼び出し回数を取得する
    pub fn verify_calls(&self) -> u32 {
        *self.verify_calls.lock().unwrap()
    }

    /// 送信済みメッセージのスナップショットを取得する
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockMailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<String, NotificationError> {
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            SendBehavior::Succeed => {}
            SendBehavior::Fail(message) => {
                return Err(NotificationError::SendFailed(message));
            }
            SendBehavior::Hang(delay) => {
                // タイムアウト検証用。呼び出し側が先に打ち切れば
                // この送信は記録されない（遅れた完了は破棄される）
                tokio::time::sleep(delay).await;
            }
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(format!("<{}@mock>", Uuid::new_v4()))
    }

    async fn verify(&self) -> Result<(), NotificationError> {
        *self.verify_calls.lock().unwrap() += 1;
        let mut failures = self.verify_failures_left.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(NotificationError::SendFailed(
                "認証情報が拒否されました".to_string(),
            ));
        }
        Ok(())
    }
}
