//! SQLite-backed record store.
//!
//! Two layers live here:
//!
//! - connection-level functions taking `&mut SqliteConnection`, so the chain
//!   manager can run a whole insertion or deletion on one transaction;
//! - [`SqliteRecordRepository`], the pool-backed reads and the outcome
//!   update used by everything else.
//!
//! Pointer writes (`set_previous`, `set_next`) are `pub(crate)` and are only
//! called from [`crate::chain`].

use connect_four::{GameStatus, WinningCell};
use sqlx::{SqliteConnection, SqlitePool};

use super::helpers::{
    decode_mode, decode_sequence, decode_status, decode_winning_cells, encode_winning_cells,
};
use crate::persistence::{GameRecord, NewRecord, PersistenceError, RecordId, RecordOrder};

/// Row type for record queries, mapped via `sqlx::FromRow`.
#[derive(sqlx::FromRow)]
struct RecordRow {
    id: i64,
    sequence: String,
    mirror_sequence: String,
    previous_id: Option<i64>,
    next_id: Option<i64>,
    mode: String,
    status: String,
    winning_cells: Option<String>,
    game_number: Option<i64>,
    created_at: i64,
}

impl TryFrom<RecordRow> for GameRecord {
    type Error = PersistenceError;

    fn try_from(r: RecordRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            sequence: decode_sequence("sequence", &r.sequence)?,
            mirror_sequence: decode_sequence("mirror_sequence", &r.mirror_sequence)?,
            previous_id: r.previous_id,
            next_id: r.next_id,
            mode: decode_mode(&r.mode)?,
            status: decode_status(&r.status)?,
            winning_cells: decode_winning_cells(r.winning_cells.as_deref())?,
            game_number: r.game_number,
            created_at: u64::try_from(r.created_at).map_err(|_| {
                PersistenceError::Decode(format!("negative created_at: {}", r.created_at))
            })?,
        })
    }
}

/// Id and back pointer of the record that follows a sequence in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub(crate) struct Successor {
    pub(crate) id: RecordId,
    pub(crate) previous_id: Option<RecordId>,
}

// ── Connection-level operations ────────────────────────────────────────

pub(crate) async fn insert_record(
    conn: &mut SqliteConnection,
    record: &NewRecord,
    previous_id: Option<RecordId>,
    next_id: Option<RecordId>,
) -> Result<RecordId, PersistenceError> {
    let winning_cells = encode_winning_cells(record.metadata.winning_cells.as_deref())?;
    let created_at = i64::try_from(record.created_at).map_err(|_| {
        PersistenceError::Decode(format!("created_at out of range: {}", record.created_at))
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO game_records
            (sequence, mirror_sequence, previous_id, next_id, mode,
             status, winning_cells, game_number, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.sequence.as_str())
    .bind(record.mirror_sequence.as_str())
    .bind(previous_id)
    .bind(next_id)
    .bind(record.metadata.mode.as_str())
    .bind(record.metadata.status.as_str())
    .bind(winning_cells)
    .bind(record.metadata.game_number)
    .bind(created_at)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    tracing::debug!(id, sequence = %record.sequence, "Wrote game record");
    Ok(id)
}

pub(crate) async fn select_by_id(
    conn: &mut SqliteConnection,
    id: RecordId,
) -> Result<Option<GameRecord>, PersistenceError> {
    let row: Option<RecordRow> = sqlx::query_as(
        r#"
        SELECT id, sequence, mirror_sequence, previous_id, next_id, mode,
               status, winning_cells, game_number, created_at
        FROM game_records
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(GameRecord::try_from).transpose()
}

/// Id of the record whose `sequence` is exactly `sequence`, if any.
///
/// Served by `idx_game_records_sequence`. Looking up a mirror key goes
/// through the same index, since a mirror duplicate is a record whose
/// *sequence* equals the candidate's mirror.
pub(crate) async fn find_id_by_sequence(
    conn: &mut SqliteConnection,
    sequence: &str,
) -> Result<Option<RecordId>, PersistenceError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM game_records WHERE sequence = ?")
        .bind(sequence)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|r| r.0))
}

/// Id of the record whose stored mirror is exactly `sequence`, if any.
///
/// Served by `idx_game_records_mirror_sequence`. Catches a record written
/// under another board width, whose mirror the current width would not
/// reproduce.
pub(crate) async fn find_id_by_mirror(
    conn: &mut SqliteConnection,
    sequence: &str,
) -> Result<Option<RecordId>, PersistenceError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM game_records WHERE mirror_sequence = ? LIMIT 1")
            .bind(sequence)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.map(|r| r.0))
}

/// The record with the smallest sequence strictly greater than `sequence`.
pub(crate) async fn select_successor(
    conn: &mut SqliteConnection,
    sequence: &str,
) -> Result<Option<Successor>, PersistenceError> {
    let row: Option<Successor> = sqlx::query_as(
        r#"
        SELECT id, previous_id
        FROM game_records
        WHERE sequence > ?
        ORDER BY sequence ASC
        LIMIT 1
        "#,
    )
    .bind(sequence)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Id of the record with the greatest sequence (the chain tail).
pub(crate) async fn select_last(
    conn: &mut SqliteConnection,
) -> Result<Option<RecordId>, PersistenceError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM game_records ORDER BY sequence DESC LIMIT 1")
            .fetch_optional(&mut *conn)
            .await?;
    Ok(row.map(|r| r.0))
}

/// Point `id`'s forward link at `next_id`.
pub(crate) async fn set_next(
    conn: &mut SqliteConnection,
    id: RecordId,
    next_id: Option<RecordId>,
) -> Result<(), PersistenceError> {
    let result = sqlx::query("UPDATE game_records SET next_id = ? WHERE id = ?")
        .bind(next_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PersistenceError::NotFound(id));
    }
    tracing::debug!(id, ?next_id, "Updated forward link");
    Ok(())
}

/// Point `id`'s back link at `previous_id`.
pub(crate) async fn set_previous(
    conn: &mut SqliteConnection,
    id: RecordId,
    previous_id: Option<RecordId>,
) -> Result<(), PersistenceError> {
    let result = sqlx::query("UPDATE game_records SET previous_id = ? WHERE id = ?")
        .bind(previous_id)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PersistenceError::NotFound(id));
    }
    tracing::debug!(id, ?previous_id, "Updated back link");
    Ok(())
}

/// Remove a record. Returns `false` if it did not exist.
pub(crate) async fn delete_record(
    conn: &mut SqliteConnection,
    id: RecordId,
) -> Result<bool, PersistenceError> {
    let result = sqlx::query("DELETE FROM game_records WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    let deleted = result.rows_affected() > 0;
    tracing::debug!(id, deleted, "Deleted game record");
    Ok(deleted)
}

// ── Pool-backed repository ─────────────────────────────────────────────

/// SQLite implementation of the record store's reads and outcome update.
#[derive(Clone)]
pub struct SqliteRecordRepository {
    pool: SqlitePool,
}

impl SqliteRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn fetch_by_id(&self, id: RecordId) -> Result<Option<GameRecord>, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        select_by_id(&mut conn, id).await
    }

    /// The record `id` points back to, resolved in one query.
    pub async fn fetch_previous_of(
        &self,
        id: RecordId,
    ) -> Result<Option<GameRecord>, PersistenceError> {
        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.sequence, p.mirror_sequence, p.previous_id, p.next_id, p.mode,
                   p.status, p.winning_cells, p.game_number, p.created_at
            FROM game_records r
            JOIN game_records p ON p.id = r.previous_id
            WHERE r.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(GameRecord::try_from).transpose()
    }

    /// The record `id` points forward to, resolved in one query.
    pub async fn fetch_next_of(
        &self,
        id: RecordId,
    ) -> Result<Option<GameRecord>, PersistenceError> {
        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT n.id, n.sequence, n.mirror_sequence, n.previous_id, n.next_id, n.mode,
                   n.status, n.winning_cells, n.game_number, n.created_at
            FROM game_records r
            JOIN game_records n ON n.id = r.next_id
            WHERE r.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(GameRecord::try_from).transpose()
    }

    /// The first record in chain order.
    pub async fn fetch_first(&self) -> Result<Option<GameRecord>, PersistenceError> {
        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT id, sequence, mirror_sequence, previous_id, next_id, mode,
                   status, winning_cells, game_number, created_at
            FROM game_records
            ORDER BY sequence ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(GameRecord::try_from).transpose()
    }

    /// The last record in chain order.
    pub async fn fetch_last(&self) -> Result<Option<GameRecord>, PersistenceError> {
        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT id, sequence, mirror_sequence, previous_id, next_id, mode,
                   status, winning_cells, game_number, created_at
            FROM game_records
            ORDER BY sequence DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        row.map(GameRecord::try_from).transpose()
    }

    /// All records in the requested order.
    ///
    /// Meant for listing and diagnostics; chain maintenance never re-sorts
    /// the table.
    pub async fn fetch_all(&self, order: RecordOrder) -> Result<Vec<GameRecord>, PersistenceError> {
        let sql = match order {
            RecordOrder::Sequence => {
                "SELECT id, sequence, mirror_sequence, previous_id, next_id, mode, \
                 status, winning_cells, game_number, created_at \
                 FROM game_records ORDER BY sequence ASC"
            }
            RecordOrder::Id => {
                "SELECT id, sequence, mirror_sequence, previous_id, next_id, mode, \
                 status, winning_cells, game_number, created_at \
                 FROM game_records ORDER BY id ASC"
            }
        };
        let rows: Vec<RecordRow> = sqlx::query_as(sql).fetch_all(&self.pool).await?;
        tracing::debug!(count = rows.len(), ?order, "Listed game records");
        rows.into_iter().map(GameRecord::try_from).collect()
    }

    pub async fn count(&self) -> Result<u64, PersistenceError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM game_records")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(row.0)
            .map_err(|_| PersistenceError::Decode(format!("negative record count: {}", row.0)))
    }

    /// Whether any record's sequence is exactly `sequence`.
    ///
    /// Pass a mirror key to ask whether the mirror image is already stored.
    pub async fn exists_by_sequence(&self, sequence: &str) -> Result<bool, PersistenceError> {
        let mut conn = self.pool.acquire().await?;
        Ok(find_id_by_sequence(&mut conn, sequence).await?.is_some())
    }

    /// Record how a game ended. Pointers and sequences are left alone.
    pub async fn update_outcome(
        &self,
        id: RecordId,
        status: GameStatus,
        winning_cells: Option<&[WinningCell]>,
    ) -> Result<(), PersistenceError> {
        let winning_cells = encode_winning_cells(winning_cells)?;
        let result =
            sqlx::query("UPDATE game_records SET status = ?, winning_cells = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(winning_cells)
                .bind(id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(PersistenceError::NotFound(id));
        }
        tracing::debug!(id, %status, "Updated game outcome");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sqlite::Database;
    use crate::persistence::GameMetadata;
    use connect_four::{BoardWidth, GameMode, MoveSequence};

    async fn test_db() -> (Database, SqliteRecordRepository) {
        let db = Database::new_in_memory().await.unwrap();
        let repo = SqliteRecordRepository::new(db.pool().clone());
        (db, repo)
    }

    fn new_record(raw: &str) -> NewRecord {
        let sequence = MoveSequence::parse(raw, BoardWidth::STANDARD).unwrap();
        NewRecord::new(
            sequence,
            BoardWidth::STANDARD,
            GameMetadata {
                mode: GameMode::HumanVsAi,
                status: GameStatus::Completed,
                winning_cells: Some(vec![
                    WinningCell::new(7, 0),
                    WinningCell::new(7, 1),
                    WinningCell::new(7, 2),
                    WinningCell::new(7, 3),
                ]),
                game_number: Some(3),
            },
        )
        .unwrap()
    }

    async fn write(db: &Database, raw: &str) -> RecordId {
        let mut conn = db.pool().acquire().await.unwrap();
        insert_record(&mut conn, &new_record(raw), None, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_fetch_roundtrip() {
        let (db, repo) = test_db().await;
        let id = write(&db, "125").await;

        let loaded = repo.fetch_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.sequence.as_str(), "125");
        assert_eq!(loaded.mirror_sequence.as_str(), "985");
        assert_eq!(loaded.mode, GameMode::HumanVsAi);
        assert_eq!(loaded.status, GameStatus::Completed);
        assert_eq!(loaded.winning_cells.as_ref().map(Vec::len), Some(4));
        assert_eq!(loaded.game_number, Some(3));
        assert!(loaded.created_at > 0);
        assert!(loaded.is_head() && loaded.is_tail());
    }

    #[tokio::test]
    async fn test_fetch_nonexistent() {
        let (_db, repo) = test_db().await;
        assert_eq!(repo.fetch_by_id(42).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_exists_by_sequence_and_mirror() {
        let (db, repo) = test_db().await;
        write(&db, "125").await;
        assert!(repo.exists_by_sequence("125").await.unwrap());
        assert!(!repo.exists_by_sequence("985").await.unwrap());
        assert!(!repo.exists_by_sequence("12").await.unwrap());
    }

    #[tokio::test]
    async fn test_fetch_all_orderings() {
        let (db, repo) = test_db().await;
        write(&db, "777").await;
        write(&db, "125").await;
        write(&db, "431").await;

        let by_sequence: Vec<String> = repo
            .fetch_all(RecordOrder::Sequence)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.sequence.into_string())
            .collect();
        assert_eq!(by_sequence, ["125", "431", "777"]);

        let by_id: Vec<String> = repo
            .fetch_all(RecordOrder::Id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.sequence.into_string())
            .collect();
        assert_eq!(by_id, ["777", "125", "431"]);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_successor_and_last_lookup() {
        let (db, _repo) = test_db().await;
        let a = write(&db, "22").await;
        let b = write(&db, "222").await;
        let c = write(&db, "3").await;

        let mut conn = db.pool().acquire().await.unwrap();
        let succ = select_successor(&mut conn, "2").await.unwrap().unwrap();
        assert_eq!(succ.id, a);
        let succ = select_successor(&mut conn, "221").await.unwrap().unwrap();
        assert_eq!(succ.id, b);
        let succ = select_successor(&mut conn, "2221").await.unwrap().unwrap();
        assert_eq!(succ.id, c);
        assert_eq!(select_successor(&mut conn, "31").await.unwrap(), None);
        assert_eq!(select_last(&mut conn).await.unwrap(), Some(c));
    }

    #[tokio::test]
    async fn test_pointer_updates_require_existing_row() {
        let (db, _repo) = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(matches!(
            set_next(&mut conn, 99, None).await,
            Err(PersistenceError::NotFound(99))
        ));
        assert!(matches!(
            set_previous(&mut conn, 99, None).await,
            Err(PersistenceError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_neighbor_joins_follow_pointers() {
        let (db, repo) = test_db().await;
        let a = write(&db, "1").await;
        let b = write(&db, "2").await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            set_next(&mut conn, a, Some(b)).await.unwrap();
            set_previous(&mut conn, b, Some(a)).await.unwrap();
        }
        assert_eq!(repo.fetch_next_of(a).await.unwrap().unwrap().id, b);
        assert_eq!(repo.fetch_previous_of(b).await.unwrap().unwrap().id, a);
        assert_eq!(repo.fetch_previous_of(a).await.unwrap(), None);
        assert_eq!(repo.fetch_next_of(b).await.unwrap(), None);
        assert_eq!(repo.fetch_next_of(404).await.unwrap(), None);
        assert_eq!(repo.fetch_first().await.unwrap().unwrap().id, a);
        assert_eq!(repo.fetch_last().await.unwrap().unwrap().id, b);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let (db, repo) = test_db().await;
        let id = write(&db, "9").await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert!(delete_record(&mut conn, id).await.unwrap());
        assert!(!delete_record(&mut conn, id).await.unwrap());
        drop(conn);
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_sequence_is_a_storage_error() {
        let (db, _repo) = test_db().await;
        write(&db, "5").await;
        let mut conn = db.pool().acquire().await.unwrap();
        let err = insert_record(&mut conn, &new_record("5"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Sqlx(_)));
    }

    #[tokio::test]
    async fn test_find_id_by_mirror() {
        let (db, _repo) = test_db().await;
        let id = write(&db, "125").await;
        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(find_id_by_mirror(&mut conn, "985").await.unwrap(), Some(id));
        assert_eq!(find_id_by_mirror(&mut conn, "125").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_outcome() {
        let (db, repo) = test_db().await;
        let id = write(&db, "44").await;
        repo.update_outcome(id, GameStatus::Abandoned, None)
            .await
            .unwrap();
        let loaded = repo.fetch_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.status, GameStatus::Abandoned);
        assert_eq!(loaded.winning_cells, None);
        assert_eq!(loaded.sequence.as_str(), "44");

        assert!(matches!(
            repo.update_outcome(1234, GameStatus::Completed, None).await,
            Err(PersistenceError::NotFound(1234))
        ));
    }

    #[tokio::test]
    async fn test_negative_created_at_is_a_decode_error() {
        let (db, repo) = test_db().await;
        let id = write(&db, "3").await;
        sqlx::query("UPDATE game_records SET created_at = -1 WHERE id = ?")
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap();
        assert!(matches!(
            repo.fetch_by_id(id).await,
            Err(PersistenceError::Decode(_))
        ));
    }
}
