//! # リポジトリ実装
//!
//! ドメイン層のエンティティを永続化するリポジトリを提供する。
//!
//! このコアが書き込むテーブルは `bookings` の 1 つだけであり、
//! 操作も冪等でない単一 INSERT のみ（更新・削除・読み取りは提供しない）。

mod booking_repository;

pub use booking_repository::{BookingRepository, PostgresBookingRepository};
