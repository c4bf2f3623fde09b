//! The ordered chain over all recorded games.
//!
//! Records form one doubly-linked list ordered by ascending move sequence.
//! [`ChainManager`] is the only writer of `previous_id` / `next_id`: every
//! insertion and deletion runs as a single transaction that finds the
//! neighbors, writes or removes the record, and relinks the neighbors. Chain
//! mutations are also serialized behind an async mutex so the neighbor search
//! and the relink can never interleave with another mutation.
//!
//! Insertion rejects a sequence that is already stored, and a sequence whose
//! mirror image is already stored. The mirror check looks both ways: the
//! candidate's mirror against stored sequences, and the candidate against
//! stored mirrors, so records written under another board width still count.

mod navigation;
pub mod verify;

pub use navigation::ChainNavigation;
pub use verify::{ChainIssue, ChainReport};

use connect_four::{BoardWidth, GameStatus, MoveSequence, SequenceError, WinningCell};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::persistence::sqlite::{self as store, Database, SqliteRecordRepository};
use crate::persistence::{
    GameMetadata, GameRecord, NewRecord, PersistenceError, RecordId, RecordOrder,
};

/// Why an insertion or outcome update did not happen.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid sequence: {0}")]
    InvalidSequence(#[from] SequenceError),
    #[error("Sequence already stored as record {existing}")]
    DuplicateExact { existing: RecordId },
    #[error("Mirror of sequence already stored as record {existing}")]
    DuplicateMirror { existing: RecordId },
    #[error("Invalid outcome: {0}")]
    InvalidOutcome(String),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ChainError {
    /// Business-rule rejections, as opposed to caller or backend errors.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::DuplicateExact { .. } | Self::DuplicateMirror { .. }
        )
    }
}

/// Owns the chain: insertion, deletion, and neighbor lookup.
pub struct ChainManager {
    pool: SqlitePool,
    records: SqliteRecordRepository,
    width: BoardWidth,
    write_lock: Mutex<()>,
}

impl ChainManager {
    pub fn new(db: &Database, width: BoardWidth) -> Self {
        Self {
            pool: db.pool().clone(),
            records: SqliteRecordRepository::new(db.pool().clone()),
            width,
            write_lock: Mutex::new(()),
        }
    }

    pub fn width(&self) -> BoardWidth {
        self.width
    }

    /// Record a game and splice it into the chain. Returns the new id.
    pub async fn insert(
        &self,
        sequence: &str,
        metadata: GameMetadata,
    ) -> Result<RecordId, ChainError> {
        let sequence = MoveSequence::parse(sequence, self.width)?;
        validate_outcome(metadata.status, metadata.winning_cells.as_deref(), self.width)?;
        let record = NewRecord::new(sequence, self.width, metadata)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(PersistenceError::from)?;

        if let Some(existing) =
            store::find_id_by_sequence(&mut *tx, record.sequence.as_str()).await?
        {
            tracing::debug!(sequence = %record.sequence, existing, "Rejected exact duplicate");
            return Err(ChainError::DuplicateExact { existing });
        }
        let mirror = record.mirror_sequence.as_str();
        let mirrored = match store::find_id_by_sequence(&mut *tx, mirror).await? {
            Some(existing) => Some(existing),
            None => store::find_id_by_mirror(&mut *tx, record.sequence.as_str()).await?,
        };
        if let Some(existing) = mirrored {
            tracing::debug!(
                sequence = %record.sequence,
                mirror = %record.mirror_sequence,
                existing,
                "Rejected mirror duplicate"
            );
            return Err(ChainError::DuplicateMirror { existing });
        }

        let (previous_id, next_id) =
            match store::select_successor(&mut *tx, record.sequence.as_str()).await? {
                Some(successor) => (successor.previous_id, Some(successor.id)),
                None => (store::select_last(&mut *tx).await?, None),
            };

        let id = store::insert_record(&mut *tx, &record, previous_id, next_id).await?;

        if let Some(previous) = previous_id {
            store::set_next(&mut *tx, previous, Some(id))
                .await
                .map_err(|e| corrupted(e, previous, "predecessor vanished during insert"))?;
        }
        if let Some(next) = next_id {
            store::set_previous(&mut *tx, next, Some(id))
                .await
                .map_err(|e| corrupted(e, next, "successor vanished during insert"))?;
        }

        tx.commit().await.map_err(PersistenceError::from)?;

        tracing::info!(
            id,
            sequence = %record.sequence,
            ?previous_id,
            ?next_id,
            "Inserted game record"
        );
        Ok(id)
    }

    /// Remove a record and close the gap it leaves.
    ///
    /// Returns `false` if there was no such record.
    pub async fn delete(&self, id: RecordId) -> Result<bool, PersistenceError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let Some(record) = store::select_by_id(&mut *tx, id).await? else {
            return Ok(false);
        };

        if let Some(previous) = record.previous_id {
            store::set_next(&mut *tx, previous, record.next_id)
                .await
                .map_err(|e| corrupted(e, previous, "predecessor missing during delete"))?;
        }
        if let Some(next) = record.next_id {
            store::set_previous(&mut *tx, next, record.previous_id)
                .await
                .map_err(|e| corrupted(e, next, "successor missing during delete"))?;
        }

        if !store::delete_record(&mut *tx, id).await? {
            return Err(corrupted(
                PersistenceError::NotFound(id),
                id,
                "record disappeared inside its own transaction",
            ));
        }

        tx.commit().await?;

        tracing::info!(
            id,
            sequence = %record.sequence,
            previous_id = ?record.previous_id,
            next_id = ?record.next_id,
            "Deleted game record"
        );
        Ok(true)
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<Option<GameRecord>, PersistenceError> {
        self.records.fetch_by_id(id).await
    }

    pub async fn get_previous(
        &self,
        id: RecordId,
    ) -> Result<Option<GameRecord>, PersistenceError> {
        self.records.fetch_previous_of(id).await
    }

    pub async fn get_next(&self, id: RecordId) -> Result<Option<GameRecord>, PersistenceError> {
        self.records.fetch_next_of(id).await
    }

    pub async fn head(&self) -> Result<Option<GameRecord>, PersistenceError> {
        self.records.fetch_first().await
    }

    pub async fn tail(&self) -> Result<Option<GameRecord>, PersistenceError> {
        self.records.fetch_last().await
    }

    pub async fn count(&self) -> Result<u64, PersistenceError> {
        self.records.count().await
    }

    pub async fn list(&self, order: RecordOrder) -> Result<Vec<GameRecord>, PersistenceError> {
        self.records.fetch_all(order).await
    }

    /// Record the final status of a game, and its winning line if it has one.
    ///
    /// Only `status` and `winning_cells` change; the chain is untouched.
    pub async fn update_outcome(
        &self,
        id: RecordId,
        status: GameStatus,
        winning_cells: Option<&[WinningCell]>,
    ) -> Result<(), ChainError> {
        validate_outcome(status, winning_cells, self.width)?;
        let _guard = self.write_lock.lock().await;
        self.records
            .update_outcome(id, status, winning_cells)
            .await?;
        tracing::info!(id, %status, "Updated game outcome");
        Ok(())
    }

    /// Walk the stored chain and report every inconsistency found.
    pub async fn verify(&self) -> Result<ChainReport, PersistenceError> {
        let records = self.records.fetch_all(RecordOrder::Id).await?;
        Ok(verify::verify_chain(&records, self.width))
    }
}

impl ChainNavigation for ChainManager {
    async fn get_by_id(&self, id: RecordId) -> Result<Option<GameRecord>, PersistenceError> {
        ChainManager::get_by_id(self, id).await
    }

    async fn get_previous(&self, id: RecordId) -> Result<Option<GameRecord>, PersistenceError> {
        ChainManager::get_previous(self, id).await
    }

    async fn get_next(&self, id: RecordId) -> Result<Option<GameRecord>, PersistenceError> {
        ChainManager::get_next(self, id).await
    }
}

/// A pointer write that found no row means the chain references a record
/// that does not exist.
fn corrupted(err: PersistenceError, id: RecordId, detail: &str) -> PersistenceError {
    match err {
        PersistenceError::NotFound(_) => {
            tracing::error!(id, detail, "Chain invariant violated; rolling back");
            PersistenceError::ChainCorrupted {
                id,
                detail: detail.to_string(),
            }
        }
        other => other,
    }
}

fn validate_outcome(
    status: GameStatus,
    winning_cells: Option<&[WinningCell]>,
    width: BoardWidth,
) -> Result<(), ChainError> {
    let Some(cells) = winning_cells else {
        return Ok(());
    };
    if status != GameStatus::Completed {
        return Err(ChainError::InvalidOutcome(format!(
            "winning cells given for a game that is {status}"
        )));
    }
    if cells.is_empty() {
        return Err(ChainError::InvalidOutcome(
            "winning line has no cells".to_string(),
        ));
    }
    if let Some(cell) = cells.iter().find(|c| c.column >= width.get()) {
        return Err(ChainError::InvalidOutcome(format!(
            "winning cell ({}, {}) is outside a {width}-column board",
            cell.row, cell.column
        )));
    }
    Ok(())
}
