//! Durable storage for recorded games.
//!
//! The only backend is SQLite (see [`sqlite`]). Chain pointers are stored on
//! each record but are written exclusively by [`crate::chain`]; this module
//! only exposes plain CRUD and indexed lookups.

pub mod sqlite;

use connect_four::{BoardWidth, GameMode, GameStatus, MoveSequence, SequenceError, WinningCell};
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned record identifier. Never reused after deletion.
pub type RecordId = i64;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record {0} not found")]
    NotFound(RecordId),
    #[error("Chain corrupted at record {id}: {detail}")]
    ChainCorrupted { id: RecordId, detail: String },
    #[error("Invalid stored value: {0}")]
    Decode(String),
}

/// Descriptive fields supplied by the caller when a game is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameMetadata {
    pub mode: GameMode,
    pub status: GameStatus,
    pub winning_cells: Option<Vec<WinningCell>>,
    pub game_number: Option<i64>,
}

/// A stored game with its chain pointers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: RecordId,
    pub sequence: MoveSequence,
    pub mirror_sequence: MoveSequence,
    pub previous_id: Option<RecordId>,
    pub next_id: Option<RecordId>,
    pub mode: GameMode,
    pub status: GameStatus,
    pub winning_cells: Option<Vec<WinningCell>>,
    pub game_number: Option<i64>,
    pub created_at: u64,
}

impl GameRecord {
    pub fn is_head(&self) -> bool {
        self.previous_id.is_none()
    }

    pub fn is_tail(&self) -> bool {
        self.next_id.is_none()
    }

    /// The sequence to show, either as played or mirrored.
    pub fn display_sequence(&self, mirrored: bool) -> &MoveSequence {
        if mirrored {
            &self.mirror_sequence
        } else {
            &self.sequence
        }
    }
}

/// A record that has not been written yet.
///
/// The mirror is derived here, once, from the sequence and board width; there
/// is no way to construct one with an arbitrary mirror.
#[derive(Debug, Clone)]
pub(crate) struct NewRecord {
    pub(crate) sequence: MoveSequence,
    pub(crate) mirror_sequence: MoveSequence,
    pub(crate) metadata: GameMetadata,
    pub(crate) created_at: u64,
}

impl NewRecord {
    pub(crate) fn new(
        sequence: MoveSequence,
        width: BoardWidth,
        metadata: GameMetadata,
    ) -> Result<Self, SequenceError> {
        let mirror_sequence = sequence.mirror(width)?;
        Ok(Self {
            sequence,
            mirror_sequence,
            metadata,
            created_at: now_timestamp(),
        })
    }
}

/// Listing order for [`sqlite::SqliteRecordRepository::fetch_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrder {
    /// Ascending move sequence, i.e. chain order.
    #[default]
    Sequence,
    /// Ascending id, i.e. insertion order.
    Id,
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
