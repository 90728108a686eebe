//! # ユースケース層
//!
//! ハンドラから呼ばれるアプリケーションロジック。ドメインの検証・整形と
//! インフラ層（ストア・メール送信）のオーケストレーションを担う。

mod dispatch;
mod template_renderer;

pub use dispatch::{DispatchError, Dispatcher};
pub use template_renderer::TemplateRenderer;
