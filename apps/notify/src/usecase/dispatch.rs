//! # 通知ディスパッチ
//!
//! 予約ペイロードを受け取り、検証 → サニタイズ → （永続化 →）メール送信の
//! パイプラインを実行するユースケース。
//!
//! ## 設計方針
//!
//! - **検証が最初**: フィールド検証に失敗したペイロードは、添付デコード・
//!   永続化・送信のいずれにも到達しない
//! - **永続化してから送信**: `create_booking` は INSERT の成功後にのみ
//!   メールを送る。送信失敗はレコードをロールバックしない（予約は有効、
//!   通知だけが失われたという運用上の区別を保つ）
//! - **送信は締め切り付き**: リレーがハングしても
//!   [`NotificationError::Timeout`] で確実に呼び出し元へ制御を返す。
//!   締め切り後に完了した送信は破棄される

use std::{sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use yoyaku_domain::{
    DomainError,
    booking::{BookingId, BookingRecord, BookingRequest, MAX_ATTACHMENT_BYTES},
    notification::{EmailAttachment, EmailMessage, NotificationError},
    sanitize,
};
use yoyaku_infra::{
    error::InfraError, mailer::MailTransport, repository::BookingRepository,
};

use crate::usecase::TemplateRenderer;

/// ディスパッチパイプラインのエラー
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// ペイロード検証・添付検査の失敗（400 系）
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// 予約レコードの永続化失敗
    #[error("予約の保存に失敗しました: {0}")]
    Storage(#[source] InfraError),

    /// メール構築・送信・タイムアウトの失敗
    #[error(transparent)]
    Delivery(#[from] NotificationError),
}

/// 予約通知のディスパッチャ
///
/// リポジトリとメールトランスポートはトレイト越しに注入する。
pub struct Dispatcher {
    repository:   Arc<dyn BookingRepository>,
    mailer:       Arc<dyn MailTransport>,
    renderer:     TemplateRenderer,
    to_address:   String,
    from_address: String,
    send_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        repository: Arc<dyn BookingRepository>,
        mailer: Arc<dyn MailTransport>,
        renderer: TemplateRenderer,
        to_address: String,
        from_address: String,
        send_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            mailer,
            renderer,
            to_address,
            from_address,
            send_timeout,
        }
    }

    /// 通知メールだけを送信する（永続化なし）
    ///
    /// 成功時は送信メッセージ ID を返す。
    #[tracing::instrument(skip_all, fields(order_id = tracing::field::Empty))]
    pub async fn dispatch_email(&self, request: BookingRequest) -> Result<String, DispatchError> {
        request.validate()?;
        let attachment = decode_attachment(&request)?;
        let record = request.into_record(Utc::now())?;
        tracing::Span::current().record("order_id", record.order_id.as_str());

        let email = self.compose(&record, attachment)?;
        let message_id = self.send_with_deadline(&email).await?;
        tracing::info!(message_id, "通知メールを送信しました");
        Ok(message_id)
    }

    /// 予約を永続化してから通知メールを送信する
    ///
    /// INSERT が失敗した場合は送信を試みない。送信が失敗・タイムアウトした
    /// 場合でもレコードは残る。
    #[tracing::instrument(skip_all, fields(order_id = tracing::field::Empty))]
    pub async fn create_booking(
        &self,
        request: BookingRequest,
    ) -> Result<(BookingId, String), DispatchError> {
        request.validate()?;
        let attachment = decode_attachment(&request)?;
        let record = request.into_record(Utc::now())?;
        tracing::Span::current().record("order_id", record.order_id.as_str());

        self.repository
            .insert(&record)
            .await
            .map_err(DispatchError::Storage)?;
        tracing::info!(booking_id = %record.id, "予約を保存しました");

        let email = self.compose(&record, attachment)?;
        let message_id = self.send_with_deadline(&email).await?;
        tracing::info!(message_id, "通知メールを送信しました");
        Ok((record.id, message_id))
    }

    fn compose(
        &self,
        record: &BookingRecord,
        attachment: Option<EmailAttachment>,
    ) -> Result<EmailMessage, NotificationError> {
        let rendered = self.renderer.render(record)?;
        Ok(EmailMessage {
            to:        self.to_address.clone(),
            // 受信側が返信ボタンで予約者に届くよう、返信先は予約者のメール
            // アドレス。未指定時は送信元に落とす
            reply_to:  record
                .user_email
                .clone()
                .unwrap_or_else(|| self.from_address.clone()),
            subject:   rendered.subject,
            html_body: rendered.html_body,
            text_body: rendered.text_body,
            attachment,
        })
    }

    async fn send_with_deadline(&self, email: &EmailMessage) -> Result<String, DispatchError> {
        match tokio::time::timeout(self.send_timeout, self.mailer.send(email)).await {
            Ok(result) => result.map_err(DispatchError::Delivery),
            Err(_) => Err(DispatchError::Delivery(NotificationError::Timeout {
                timeout_secs: self.send_timeout.as_secs(),
            })),
        }
    }
}

/// 添付ファイルをデコード・検査する
///
/// ペア規則（`attachment` と `attachmentName` が揃って初めて添付扱い）を
/// 適用し、デコード後サイズが上限を超えるものを拒否する。エンコード長から
/// 明らかに超過と分かる場合はデコードせずに拒否する。
fn decode_attachment(request: &BookingRequest) -> Result<Option<EmailAttachment>, DomainError> {
    if !request.has_attachment() {
        return Ok(None);
    }

    let encoded = request.attachment.as_deref().unwrap_or_default().trim();
    // パディングを差し引いたデコード後サイズ。明らかな超過はデコードせずに弾く
    let padding = encoded.bytes().rev().take_while(|&b| b == b'=').count();
    let estimated = (encoded.len() / 4 * 3).saturating_sub(padding);
    if estimated > MAX_ATTACHMENT_BYTES {
        return Err(DomainError::AttachmentTooLarge {
            size:  estimated,
            limit: MAX_ATTACHMENT_BYTES,
        });
    }

    let content = BASE64
        .decode(encoded)
        .map_err(|e| DomainError::InvalidAttachment(e.to_string()))?;
    if content.len() > MAX_ATTACHMENT_BYTES {
        return Err(DomainError::AttachmentTooLarge {
            size:  content.len(),
            limit: MAX_ATTACHMENT_BYTES,
        });
    }

    let filename = sanitize::strip_tags(
        request.attachment_name.as_deref().unwrap_or_default().trim(),
    );
    let content_type = request
        .attachment_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();

    Ok(Some(EmailAttachment {
        filename,
        content_type,
        content,
    }))
}
