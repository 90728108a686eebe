//! # Notify サービス設定
//!
//! 環境変数からサーバーの設定を読み込む。
//!
//! ## デプロイメントモード
//!
//! `APP_ENV` が `production` / `development` を切り替え、以下に影響する:
//!
//! - SMTP / DB の接続プールサイズ（本番は大きく）
//! - `/send-email` のレート制限（本番 100 / 15 分、それ以外 1000）
//! - TLS の証明書検証（本番以外は緩和）
//! - 500 レスポンスのエラー詳細の秘匿（本番のみ）

use std::{env, str::FromStr, time::Duration};

/// デプロイメントモード
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    /// 環境変数 `APP_ENV` から読み取る（未設定・不正値は development）
    pub fn from_env() -> Self {
        env::var("APP_ENV")
            .ok()
            .and_then(|v| Self::from_str(&v).ok())
            .unwrap_or(Self::Development)
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Notify サーバーの設定
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// デプロイメントモード
    pub environment: Environment,
    /// データベース接続 URL
    pub database_url: String,
    /// DB 接続プールの最大接続数
    pub db_max_connections: u32,
    /// CORS で許可するオリジン
    pub cors_allowed_origins: Vec<String>,
    /// メールリレー設定
    pub mail: MailConfig,
    /// `/send-email` のレート制限
    pub rate_limit: RateLimitConfig,
}

/// メールリレーの設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える:
/// - `smtp`: SMTP リレー経由で送信（デフォルト）
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// 送信バックエンド（"smtp" | "noop"）
    pub backend:              String,
    /// SMTP リレーのホスト名
    pub smtp_host:            String,
    /// SMTP リレーのポート番号
    pub smtp_port:            u16,
    /// リレー認証ユーザー名
    pub smtp_username:        Option<String>,
    /// リレー認証パスワード
    pub smtp_password:        Option<String>,
    /// TLS を使用するか（ローカルの Mailpit 等では false にする）
    pub use_tls:              bool,
    /// 証明書検証を緩和するか（本番では常に false）
    pub accept_invalid_certs: bool,
    /// コネクションプールの最大接続数（本番 5 / それ以外 1）
    pub pool_max_size:        u32,
    /// 送信元メールアドレス
    pub from_address:         String,
    /// 通知の固定宛先アドレス
    pub to_address:           String,
    /// 送信タイムアウト
    pub send_timeout:         Duration,
}

/// レート制限の設定（固定ウィンドウ、クライアント IP 単位）
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// ウィンドウ幅
    pub window:       Duration,
    /// ウィンドウあたりの最大リクエスト数
    pub max_requests: u32,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        let environment = Environment::from_env();

        Self {
            host: env::var("NOTIFY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .expect("PORT は有効なポート番号である必要があります"),
            environment,
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL が設定されていません"),
            db_max_connections: if environment.is_production() { 10 } else { 5 },
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            mail: MailConfig::from_env(environment),
            rate_limit: RateLimitConfig {
                window:       Duration::from_secs(15 * 60),
                max_requests: if environment.is_production() { 100 } else { 1000 },
            },
        }
    }
}

impl MailConfig {
    /// 環境変数からメールリレー設定を読み込む
    fn from_env(environment: Environment) -> Self {
        Self {
            backend:              env::var("NOTIFICATION_BACKEND")
                .unwrap_or_else(|_| "smtp".to_string()),
            smtp_host:            env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            smtp_port:            env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .expect("SMTP_PORT は有効なポート番号である必要があります"),
            smtp_username:        env::var("SMTP_USERNAME").ok(),
            smtp_password:        env::var("SMTP_PASSWORD").ok(),
            use_tls:              env::var("SMTP_TLS")
                .map(|v| v != "false")
                .unwrap_or(true),
            accept_invalid_certs: !environment.is_production(),
            pool_max_size:        if environment.is_production() { 5 } else { 1 },
            from_address:         env::var("NOTIFY_FROM_ADDRESS")
                .unwrap_or_else(|_| "noreply@yoyaku.example.com".to_string()),
            to_address:           env::var("NOTIFY_TO_ADDRESS")
                .unwrap_or_else(|_| "booking@yoyaku.example.com".to_string()),
            send_timeout:         Duration::from_secs(
                env::var("SMTP_SEND_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .expect("SMTP_SEND_TIMEOUT_SECS は秒数である必要があります"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn environmentは小文字の文字列からパースできる() {
        assert_eq!(
            Environment::from_str("production").unwrap(),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str("development").unwrap(),
            Environment::Development
        );
        assert!(Environment::from_str("staging").is_err());
    }

    #[test]
    fn is_productionは本番のみtrue() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
    }

    #[test]
    fn displayは小文字表現を返す() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(Environment::Development.to_string(), "development");
    }
}
