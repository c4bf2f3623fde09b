//! SQLite-backed record store.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode**: one writer and multiple concurrent readers.
//! - **Foreign keys enabled**: chain pointers reference `game_records(id)`.
//! - **Embedded migrations**: `sqlx::migrate!` runs `migrations/001_game_records.sql`
//!   when [`Database::open`] is called. The schema is idempotent.
//!
//! ## Indexes
//!
//! `sequence` carries a unique index and `mirror_sequence` a plain one. The
//! duplicate checks look the candidate up in both, and the insertion-point
//! search (`sequence > ? ORDER BY sequence LIMIT 1`) is answered from the
//! `sequence` index, so no operation scans the table.
//!
//! Enum columns (mode, status) are stored as `TEXT` and decoded through
//! [`helpers`]; winning cells are a JSON array of `[row, col]` pairs.

mod database;
mod record_repo;
pub(crate) mod helpers;

pub use database::Database;
pub use record_repo::SqliteRecordRepository;
pub(crate) use record_repo::{
    delete_record, find_id_by_mirror, find_id_by_sequence, insert_record, select_by_id,
    select_last, select_successor, set_next, set_previous,
};
