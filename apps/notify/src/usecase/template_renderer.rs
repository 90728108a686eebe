//! # 通知メールテンプレート
//!
//! Tera で HTML 版とプレーンテキスト版の本文を組み立てる。テンプレートは
//! コンパイル時に埋め込み、起動時に一度だけパースする。

use chrono::DateTime;
use tera::Tera;
use yoyaku_domain::{booking::BookingRecord, notification::NotificationError};

const HTML_TEMPLATE: &str = include_str!("../../templates/booking_email.html");
const TEXT_TEMPLATE: &str = include_str!("../../templates/booking_email.txt");

/// レンダリング済みの件名と本文
#[derive(Debug)]
pub struct RenderedEmail {
    pub subject:   String,
    pub html_body: String,
    pub text_body: String,
}

/// 予約通知メールのレンダラ
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self, NotificationError> {
        let mut tera = Tera::default();
        tera.add_raw_template("booking_email.html", HTML_TEMPLATE)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
        tera.add_raw_template("booking_email.txt", TEXT_TEMPLATE)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
        Ok(Self { tera })
    }

    pub fn render(&self, record: &BookingRecord) -> Result<RenderedEmail, NotificationError> {
        let mut context = tera::Context::new();
        context.insert("order_id", &record.order_id);
        context.insert("call_type", &record.call_type);
        context.insert("time_range", &format_time_range(&record.start_time, &record.end_time));
        context.insert("duration", &format_duration(record.duration_minutes));
        context.insert("user_id", &record.user_id);
        context.insert("user_email", record.user_email.as_deref().unwrap_or("N/A"));
        context.insert("price", &format!("{:.2}", record.price));
        context.insert("order_status", &record.order_status);
        context.insert("rejection_reason", &record.rejection_reason);

        let html_body = self
            .tera
            .render("booking_email.html", &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;
        let text_body = self
            .tera
            .render("booking_email.txt", &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(RenderedEmail {
            subject: format!("New Booking - Order #{}", record.order_id),
            html_body,
            text_body,
        })
    }
}

/// RFC 3339 でパースできた場合は読みやすい形式に整形し、できない場合は
/// 入力をそのまま使う
fn format_time_range(start: &str, end: &str) -> String {
    format!("{} - {}", format_instant(start), format_instant(end))
}

fn format_instant(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M %:z").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// 整数値なら小数点を出さない（30.0 分 → "30"）
fn format_duration(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{minutes:.0}")
    } else {
        minutes.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use yoyaku_domain::booking::BookingId;

    use super::*;

    fn record() -> BookingRecord {
        BookingRecord {
            id:               BookingId::new(),
            order_id:         "ORD-100".to_string(),
            call_type:        "consultation".to_string(),
            start_time:       "2026-03-01T10:00:00+00:00".to_string(),
            end_time:         "2026-03-01T10:30:00+00:00".to_string(),
            duration_minutes: 30.0,
            user_id:          "user-1".to_string(),
            user_email:       Some("user@example.com".to_string()),
            price:            49.5,
            order_status:     None,
            rejection_reason: None,
            created:          Utc::now(),
            confirmed:        false,
        }
    }

    #[test]
    fn 件名に注文idが入る() {
        let renderer = TemplateRenderer::new().unwrap();
        let rendered = renderer.render(&record()).unwrap();

        assert_eq!(rendered.subject, "New Booking - Order #ORD-100");
    }

    #[test]
    fn 本文に主要フィールドが含まれる() {
        let renderer = TemplateRenderer::new().unwrap();
        let rendered = renderer.render(&record()).unwrap();

        assert!(rendered.html_body.contains("ORD-100"));
        assert!(rendered.html_body.contains("consultation"));
        assert!(rendered.html_body.contains("49.50"));
        assert!(rendered.text_body.contains("user@example.com"));
        assert!(rendered.text_body.contains("2026-03-01 10:00 +00:00"));
    }

    #[test]
    fn メールアドレス未指定時はプレースホルダを表示する() {
        let mut rec = record();
        rec.user_email = None;

        let renderer = TemplateRenderer::new().unwrap();
        let rendered = renderer.render(&rec).unwrap();

        assert!(rendered.text_body.contains("N/A"));
    }

    #[test]
    fn ステータスと却下理由は指定時のみ現れる() {
        let renderer = TemplateRenderer::new().unwrap();
        let without = renderer.render(&record()).unwrap();
        assert!(!without.html_body.contains("Status"));

        let mut rec = record();
        rec.order_status = Some("rejected".to_string());
        rec.rejection_reason = Some("double booking".to_string());
        let with = renderer.render(&rec).unwrap();

        assert!(with.html_body.contains("rejected"));
        assert!(with.html_body.contains("double booking"));
    }

    #[test]
    fn 不正な日時文字列はそのまま表示する() {
        let mut rec = record();
        rec.start_time = "tomorrow".to_string();

        let renderer = TemplateRenderer::new().unwrap();
        let rendered = renderer.render(&rec).unwrap();

        assert!(rendered.text_body.contains("tomorrow"));
    }
}
