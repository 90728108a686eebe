//! SMTP 送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールをリレーに送信する。
//!
//! ## 接続プール
//!
//! lettre のコネクションプールを同時接続数上限付きで使用する。
//! 上限（本番は開発より大きい）は設定から渡され、上限超過分の送信は
//! lettre のプールが内部でキューイングする。プールの会計はすべて
//! lettre 側が持つため、このモジュールに可変共有状態はない。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{
        Attachment,
        Body,
        Mailbox,
        Message,
        MultiPart,
        SinglePart,
        header::ContentType,
    },
    transport::smtp::{
        PoolConfig,
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};
use uuid::Uuid;
use yoyaku_domain::notification::{EmailMessage, NotificationError};

use super::MailTransport;

/// SMTP 送信の設定
///
/// 値は環境変数から組み立てられ、アプリ層の設定モジュールが渡す。
#[derive(Debug, Clone)]
pub struct SmtpMailerConfig {
    /// SMTP リレーのホスト名
    pub host: String,
    /// SMTP リレーのポート番号。TLS 有効時、465 は接続直後から TLS、
    /// それ以外（587 等）は STARTTLS を使用する
    pub port: u16,
    /// 認証ユーザー名（リレーが認証不要なら `None`）
    pub username: Option<String>,
    /// 認証パスワード
    pub password: Option<String>,
    /// 送信元メールアドレス
    pub from_address: String,
    /// コネクションプールの最大接続数
    pub pool_max_size: u32,
    /// TLS を使用するか（ローカルの Mailpit 等では false）
    pub use_tls: bool,
    /// 証明書検証を緩和するか（本番以外でのみ true）
    pub accept_invalid_certs: bool,
}

/// SMTP 送信チャネル
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をプール設定付きでラップする。
pub struct SmtpMailer {
    transport:    AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// トランスポートはここで一度だけ構築され、以後すべてのリクエストと
    /// 疎通確認ループが同じプールを共有する。
    pub fn new(config: SmtpMailerConfig) -> Result<Self, NotificationError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .pool_config(PoolConfig::new().max_size(config.pool_max_size));

        if config.use_tls {
            let tls = TlsParameters::builder(config.host.clone())
                .dangerous_accept_invalid_certs(config.accept_invalid_certs)
                .build()
                .map_err(|e| NotificationError::BuildFailed(format!("TLS 設定不正: {e}")))?;
            // 465 は接続直後から TLS（implicit）、587 等のサブミッションポートは
            // STARTTLS でアップグレードする
            let mode = if config.port == 465 {
                Tls::Wrapper(tls)
            } else {
                Tls::Required(tls)
            };
            builder = builder.tls(mode);
        }

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport:    builder.build(),
            from_address: config.from_address,
        })
    }

    /// `EmailMessage` から lettre の `Message` を組み立てる
    ///
    /// 本文は text/html の alternative、添付がある場合は mixed で包む。
    /// `Message-ID` ヘッダは呼び出し元が採番したものを設定する
    /// （SMTP 応答はメッセージ ID を運ばないため、自前で採番して返す）。
    fn build_message(
        &self,
        email: &EmailMessage,
        message_id: &str,
    ) -> Result<Message, NotificationError> {
        let from: Mailbox = format!("Booking System <{}>", self.from_address)
            .parse()
            .map_err(|e| NotificationError::BuildFailed(format!("送信元アドレス不正: {e}")))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| NotificationError::BuildFailed(format!("宛先アドレス不正: {e}")))?;
        let reply_to: Mailbox = email
            .reply_to
            .parse()
            .map_err(|e| NotificationError::BuildFailed(format!("返信先アドレス不正: {e}")))?;

        let builder = Message::builder()
            .from(from)
            .to(to)
            .reply_to(reply_to)
            .message_id(Some(message_id.to_string()))
            .subject(email.subject.clone());

        let alternative = MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(email.text_body.clone()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(email.html_body.clone()),
            );

        let message = match &email.attachment {
            Some(att) => {
                let content_type = ContentType::parse(&att.content_type).map_err(|e| {
                    NotificationError::BuildFailed(format!(
                        "添付ファイルの MIME タイプ不正 ({}): {e}",
                        att.content_type
                    ))
                })?;
                let part = Attachment::new(att.filename.clone())
                    .body(Body::new(att.content.clone()), content_type);
                builder.multipart(MultiPart::mixed().multipart(alternative).singlepart(part))
            }
            None => builder.multipart(alternative),
        }
        .map_err(|e| NotificationError::BuildFailed(format!("メッセージ構築失敗: {e}")))?;

        Ok(message)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    #[tracing::instrument(skip_all, level = "debug", fields(subject = %email.subject))]
    async fn send(&self, email: &EmailMessage) -> Result<String, NotificationError> {
        let message_id = format!("<{}@yoyaku-notify>", Uuid::new_v4());
        let message = self.build_message(email, &message_id)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(message_id)
    }

    async fn verify(&self) -> Result<(), NotificationError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(NotificationError::SendFailed(
                "SMTP リレーが応答しません".to_string(),
            )),
            Err(e) => Err(NotificationError::SendFailed(format!(
                "SMTP 疎通確認失敗: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use yoyaku_domain::notification::EmailAttachment;

    use super::*;

    fn test_config() -> SmtpMailerConfig {
        SmtpMailerConfig {
            host: "localhost".to_string(),
            port: 1025,
            username: None,
            password: None,
            from_address: "noreply@yoyaku.example.com".to_string(),
            pool_max_size: 1,
            use_tls: false,
            accept_invalid_certs: false,
        }
    }

    fn test_email() -> EmailMessage {
        EmailMessage {
            to:         "booking@yoyaku.example.com".to_string(),
            reply_to:   "user@example.com".to_string(),
            subject:    "New Booking - Order #A1".to_string(),
            html_body:  "<p>details</p>".to_string(),
            text_body:  "details".to_string(),
            attachment: None,
        }
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmtpMailer>();
    }

    // プール付きトランスポートの構築・破棄は tokio ランタイムを要求するため、
    // SmtpMailer を作るテストはすべて非同期にする

    #[tokio::test]
    async fn tls有効時はサブミッションポートでも構築できる() {
        let mut config = test_config();
        config.use_tls = true;
        config.port = 587;
        assert!(SmtpMailer::new(config).is_ok());

        let mut config = test_config();
        config.use_tls = true;
        config.port = 465;
        assert!(SmtpMailer::new(config).is_ok());
    }

    #[tokio::test]
    async fn メッセージを組み立てられる() {
        let mailer = SmtpMailer::new(test_config()).unwrap();
        let message = mailer
            .build_message(&test_email(), "<test-id@yoyaku-notify>")
            .unwrap();

        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("New Booking - Order #A1"));
        assert!(formatted.contains("Reply-To: user@example.com"));
        assert!(formatted.contains("<test-id@yoyaku-notify>"));
    }

    #[tokio::test]
    async fn 添付ファイル付きメッセージはmultipart_mixedになる() {
        let mailer = SmtpMailer::new(test_config()).unwrap();
        let mut email = test_email();
        email.attachment = Some(EmailAttachment {
            filename:     "report.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            content:      vec![0x25, 0x50, 0x44, 0x46],
        });

        let message = mailer
            .build_message(&email, "<test-id@yoyaku-notify>")
            .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();
        assert!(formatted.contains("multipart/mixed"));
        assert!(formatted.contains("report.pdf"));
        assert!(formatted.contains("application/pdf"));
    }

    #[tokio::test]
    async fn 不正なmimeタイプはbuild_failedになる() {
        let mailer = SmtpMailer::new(test_config()).unwrap();
        let mut email = test_email();
        email.attachment = Some(EmailAttachment {
            filename:     "x".to_string(),
            content_type: "not a mime type".to_string(),
            content:      vec![],
        });

        let err = mailer
            .build_message(&email, "<test-id@yoyaku-notify>")
            .unwrap_err();
        assert!(matches!(err, NotificationError::BuildFailed(_)));
    }

    #[tokio::test]
    async fn 不正な宛先アドレスはbuild_failedになる() {
        let mailer = SmtpMailer::new(test_config()).unwrap();
        let mut email = test_email();
        email.to = "not-an-address".to_string();

        let err = mailer
            .build_message(&email, "<test-id@yoyaku-notify>")
            .unwrap_err();
        assert!(matches!(err, NotificationError::BuildFailed(_)));
    }
}
