//! # 入力サニタイズ
//!
//! HTML メール本文に埋め込まれる自由入力文字列からタグ様の部分文字列を除去する。
//!
//! ## 設計方針
//!
//! - **正規表現による単純除去**: `<...>` にマッチする部分を削除するだけで、
//!   HTML パーサーではない。多層防御の一枚であり、セキュリティ境界ではない
//! - **冪等**: 一度サニタイズした文字列を再度通しても変化しない

use std::sync::LazyLock;

use regex::Regex;

/// タグ様部分文字列にマッチするパターン
///
/// `<` から次の `>` まで（`>` が無い場合は行末まで）を 1 マッチとする。
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>?").expect("固定パターンのコンパイルは失敗しない"));

/// 文字列からタグ様の部分文字列を除去する
///
/// HTML 本文・件名に埋め込む自由入力フィールドすべてに適用する。
///
/// # 例
///
/// ```
/// use yoyaku_domain::sanitize::strip_tags;
///
/// assert_eq!(strip_tags("<script>alert(1)</script>ORD-1"), "alert(1)ORD-1");
/// assert_eq!(strip_tags("ORD-1"), "ORD-1");
/// ```
pub fn strip_tags(input: &str) -> String {
    TAG_PATTERN.replace_all(input, "").into_owned()
}
