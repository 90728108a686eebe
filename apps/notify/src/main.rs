//! Notify サービスのエントリポイント
//!
//! 起動順: 設定読み込み → DB プール + マイグレーション → メーラー構築 →
//! 疎通確認ループ起動 → HTTP サーバー起動。SIGINT / SIGTERM で
//! グレースフルシャットダウンし、疎通確認ループを停止する。

use std::{net::SocketAddr, sync::Arc, time::Instant};

use anyhow::Context;
use yoyaku_infra::{
    db,
    mailer::{
        MailTransport, NoopMailer, SmtpMailer, SmtpMailerConfig, VERIFY_CHECK_INTERVAL,
        VERIFY_RETRY_DELAY, spawn_verification_loop,
    },
    repository::PostgresBookingRepository,
};
use yoyaku_notify::{
    app::build_router,
    config::AppConfig,
    handler::AppState,
    usecase::{Dispatcher, TemplateRenderer},
};
use yoyaku_shared::observability::{self, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    observability::init_tracing(LogFormat::from_env());

    let config = AppConfig::from_env();
    tracing::info!(
        environment = %config.environment,
        "Notify サービスを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(&config.database_url, config.db_max_connections)
        .await
        .context("データベース接続プールの作成に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;

    let mailer: Arc<dyn MailTransport> = match config.mail.backend.as_str() {
        "noop" => Arc::new(NoopMailer),
        _ => Arc::new(SmtpMailer::new(SmtpMailerConfig {
            host:                 config.mail.smtp_host.clone(),
            port:                 config.mail.smtp_port,
            username:             config.mail.smtp_username.clone(),
            password:             config.mail.smtp_password.clone(),
            from_address:         config.mail.from_address.clone(),
            pool_max_size:        config.mail.pool_max_size,
            use_tls:              config.mail.use_tls,
            accept_invalid_certs: config.mail.accept_invalid_certs,
        })?),
    };

    // リレー疎通をバックグラウンドで確認し続ける。失敗は起動を妨げない
    let verify_handle =
        spawn_verification_loop(mailer.clone(), VERIFY_RETRY_DELAY, VERIFY_CHECK_INTERVAL);

    let dispatcher = Dispatcher::new(
        Arc::new(PostgresBookingRepository::new(pool.clone())),
        mailer,
        TemplateRenderer::new()?,
        config.mail.to_address.clone(),
        config.mail.from_address.clone(),
        config.mail.send_timeout,
    );

    let state = Arc::new(AppState {
        dispatcher,
        environment: config.environment,
        db: Some(pool),
        started_at: Instant::now(),
    });

    let app = build_router(state, &config.cors_allowed_origins, config.rate_limit);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{addr} へのバインドに失敗しました"))?;
    tracing::info!("リクエストの受け付けを開始します");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("サーバーの実行中にエラーが発生しました")?;

    verify_handle.abort();
    tracing::info!("サービスを停止しました");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("SIGINT ハンドラの登録に失敗しました");
    };

    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("SIGTERM ハンドラの登録に失敗しました")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("シャットダウンシグナルを受信しました");
}
