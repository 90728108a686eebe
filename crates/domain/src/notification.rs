//! # 通知
//!
//! メール通知のドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **一時オブジェクト**: [`EmailMessage`] は永続化されない。
//!   コンポーザーが生成し、送信チャネルに渡された後は破棄される
//! - **1 予約 = 最大 1 通知**: ファンアウトもバッチングもしない

use thiserror::Error;

/// 通知送信エラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メッセージの組み立てに失敗（アドレス不正、MIME タイプ不正など）
    #[error("メッセージ構築失敗: {0}")]
    BuildFailed(String),

    /// リレーへの送信に失敗（接続不能、認証拒否、リレー側エラー）
    #[error("メール送信失敗: {0}")]
    SendFailed(String),

    /// 送信がタイムアウトした
    ///
    /// 待機側の打ち切りであり、リレー側の送信処理が完了したかどうかは不明。
    /// 遅れて完了した送信は破棄される（取り消しはしない）。
    #[error("メール送信タイムアウト（{timeout_secs} 秒）")]
    Timeout {
        /// 適用されたタイムアウト秒数
        timeout_secs: u64,
    },

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリング失敗: {0}")]
    TemplateFailed(String),
}

/// メールメッセージ
///
/// コンポーザーの出力。`MailTransport` に渡される。
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// 送信先メールアドレス（設定で固定）
    pub to:         String,
    /// 返信先（予約者のメールアドレス、無ければ送信元）
    pub reply_to:   String,
    /// 件名（注文 ID を含む）
    pub subject:    String,
    /// HTML 本文
    pub html_body:  String,
    /// プレーンテキスト本文
    pub text_body:  String,
    /// 添付ファイル（0 または 1 件）
    pub attachment: Option<EmailAttachment>,
}

/// メール添付ファイル
///
/// デコード済みのバイト列を保持する。サイズ上限
/// （[`crate::booking::MAX_ATTACHMENT_BYTES`]）の検査はデコード時に済んでいる。
#[derive(Clone)]
pub struct EmailAttachment {
    /// サニタイズ済みのファイル名
    pub filename:     String,
    /// MIME タイプ（未指定時は `application/octet-stream`）
    pub content_type: String,
    /// デコード済みバイト列
    pub content:      Vec<u8>,
}

// 添付本体はログに出さない（サイズのみ表示）
impl std::fmt::Debug for EmailAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailAttachment")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("content_len", &self.content.len())
            .finish()
    }
}
