//! ディスパッチユースケースの結合テスト
//!
//! モックのリポジトリとメールトランスポートを注入し、
//! 検証 → 永続化 → 送信のパイプライン順序と障害時の挙動を検証する。

use std::{sync::Arc, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use pretty_assertions::assert_eq;
use yoyaku_domain::{
    DomainError,
    booking::{BookingRequest, MAX_ATTACHMENT_BYTES},
};
use yoyaku_infra::mock::{MockBookingRepository, MockMailTransport};
use yoyaku_notify::usecase::{DispatchError, Dispatcher, TemplateRenderer};

const TO_ADDRESS: &str = "booking@yoyaku.example.com";
const FROM_ADDRESS: &str = "noreply@yoyaku.example.com";

fn dispatcher(
    repository: &MockBookingRepository,
    mailer: &MockMailTransport,
    send_timeout: Duration,
) -> Dispatcher {
    Dispatcher::new(
        Arc::new(repository.clone()),
        Arc::new(mailer.clone()),
        TemplateRenderer::new().unwrap(),
        TO_ADDRESS.to_string(),
        FROM_ADDRESS.to_string(),
        send_timeout,
    )
}

fn valid_request() -> BookingRequest {
    BookingRequest {
        order_id: Some("ORD-200".to_string()),
        call_type: Some("video".to_string()),
        start_time: Some("2026-03-01T10:00:00Z".to_string()),
        end_time: Some("2026-03-01T10:30:00Z".to_string()),
        duration: Some(30.0),
        user_id: Some("user-7".to_string()),
        user_email: Some("customer@example.com".to_string()),
        price: Some(50.0),
        ..BookingRequest::default()
    }
}

#[tokio::test]
async fn 有効なリクエストで予約が保存され通知が送信される() {
    let repository = MockBookingRepository::new();
    let mailer = MockMailTransport::new();
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    let (booking_id, message_id) = dispatcher.create_booking(valid_request()).await.unwrap();

    let records = repository.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, booking_id);
    assert_eq!(records[0].order_id, "ORD-200");

    let sent = mailer.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, TO_ADDRESS);
    assert_eq!(sent[0].reply_to, "customer@example.com");
    assert!(sent[0].subject.contains("ORD-200"));
    assert!(message_id.contains('@'));
}

#[tokio::test]
async fn dispatch_emailは永続化せずに送信だけ行う() {
    let repository = MockBookingRepository::new();
    let mailer = MockMailTransport::new();
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    dispatcher.dispatch_email(valid_request()).await.unwrap();

    assert!(repository.records().is_empty());
    assert_eq!(mailer.sent_emails().len(), 1);
}

#[tokio::test]
async fn 検証に失敗すると保存も送信も行われない() {
    let repository = MockBookingRepository::new();
    let mailer = MockMailTransport::new();
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    let err = dispatcher
        .create_booking(BookingRequest::default())
        .await
        .unwrap_err();

    match err {
        DispatchError::Invalid(DomainError::MissingFields(fields)) => {
            assert!(fields.contains(&"orderId"));
            assert!(fields.contains(&"price"));
        }
        other => panic!("想定外のエラー: {other:?}"),
    }
    assert!(repository.records().is_empty());
    assert!(mailer.sent_emails().is_empty());
}

#[tokio::test]
async fn サイズ超過の添付は保存前に拒否される() {
    let repository = MockBookingRepository::new();
    let mailer = MockMailTransport::new();
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    let mut request = valid_request();
    request.attachment = Some(BASE64.encode(vec![0u8; MAX_ATTACHMENT_BYTES + 1]));
    request.attachment_name = Some("huge.bin".to_string());

    let err = dispatcher.create_booking(request).await.unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Invalid(DomainError::AttachmentTooLarge { .. })
    ));
    assert!(repository.records().is_empty());
    assert!(mailer.sent_emails().is_empty());
}

#[tokio::test]
async fn ストア障害時は送信を試みない() {
    let repository = MockBookingRepository::new();
    repository.fail_inserts(true);
    let mailer = MockMailTransport::new();
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    let err = dispatcher.create_booking(valid_request()).await.unwrap_err();

    assert!(matches!(err, DispatchError::Storage(_)));
    assert!(mailer.sent_emails().is_empty());
}

#[tokio::test]
async fn 送信失敗でも予約レコードは残る() {
    let repository = MockBookingRepository::new();
    let mailer = MockMailTransport::new();
    mailer.fail_sends("リレーが接続を拒否しました");
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    let err = dispatcher.create_booking(valid_request()).await.unwrap_err();

    assert!(matches!(err, DispatchError::Delivery(_)));
    assert_eq!(repository.records().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn ハングするリレーはタイムアウトで打ち切られる() {
    let repository = MockBookingRepository::new();
    let mailer = MockMailTransport::new();
    mailer.hang_sends(Duration::from_secs(120));
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    let before = tokio::time::Instant::now();
    let err = dispatcher.create_booking(valid_request()).await.unwrap_err();
    let elapsed = before.elapsed();

    match err {
        DispatchError::Delivery(
            yoyaku_domain::notification::NotificationError::Timeout { timeout_secs },
        ) => assert_eq!(timeout_secs, 30),
        other => panic!("想定外のエラー: {other:?}"),
    }
    // 締め切りちょうどで戻り、ハング時間まで待たされない
    assert_eq!(elapsed, Duration::from_secs(30));
    // 打ち切られた送信は記録されない（遅れた完了は破棄される）
    assert!(mailer.sent_emails().is_empty());
    // 予約自体は送信前に保存済み
    assert_eq!(repository.records().len(), 1);
}

#[tokio::test]
async fn 同一orderIdの予約は両方保存される() {
    let repository = MockBookingRepository::new();
    let mailer = MockMailTransport::new();
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    let (first, _) = dispatcher.create_booking(valid_request()).await.unwrap();
    let (second, _) = dispatcher.create_booking(valid_request()).await.unwrap();

    let records = repository.records();
    assert_eq!(records.len(), 2);
    assert_ne!(first, second);
    assert_eq!(records[0].order_id, records[1].order_id);
    assert_eq!(mailer.sent_emails().len(), 2);
}

#[tokio::test]
async fn メールアドレス未指定時は返信先が送信元に落ちる() {
    let repository = MockBookingRepository::new();
    let mailer = MockMailTransport::new();
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    let mut request = valid_request();
    request.user_email = None;
    dispatcher.dispatch_email(request).await.unwrap();

    assert_eq!(mailer.sent_emails()[0].reply_to, FROM_ADDRESS);
}

#[tokio::test]
async fn 本文中のhtmlタグは送信前に除去される() {
    let repository = MockBookingRepository::new();
    let mailer = MockMailTransport::new();
    let dispatcher = dispatcher(&repository, &mailer, Duration::from_secs(30));

    let mut request = valid_request();
    request.order_id = Some("<script>alert(1)</script>ORD-9".to_string());
    dispatcher.dispatch_email(request).await.unwrap();

    let sent = mailer.sent_emails();
    assert!(!sent[0].subject.contains("<script>"));
    assert!(sent[0].subject.contains("ORD-9"));
}
