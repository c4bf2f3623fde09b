//! Shared encode/decode helpers for SQLite ↔ domain type conversions.
//!
//! Enum columns are `TEXT` guarded by `CHECK` constraints, so a value that
//! fails to decode means the file was edited outside the archive and is
//! reported as [`PersistenceError::Decode`] instead of being papered over.

use connect_four::{GameMode, GameStatus, MoveSequence, WinningCell};

use crate::persistence::PersistenceError;

// ── Enums ──────────────────────────────────────────────────────────────

pub fn decode_mode(s: &str) -> Result<GameMode, PersistenceError> {
    s.parse()
        .map_err(|e| PersistenceError::Decode(format!("mode: {e}")))
}

pub fn decode_status(s: &str) -> Result<GameStatus, PersistenceError> {
    s.parse()
        .map_err(|e| PersistenceError::Decode(format!("status: {e}")))
}

// ── Sequences ──────────────────────────────────────────────────────────

pub fn decode_sequence(column: &str, raw: &str) -> Result<MoveSequence, PersistenceError> {
    MoveSequence::parse_digits(raw)
        .map_err(|e| PersistenceError::Decode(format!("{column} {raw:?}: {e}")))
}

// ── Winning cells ──────────────────────────────────────────────────────

/// Encode a winning line as a JSON array of `[row, col]` pairs.
pub fn encode_winning_cells(
    cells: Option<&[WinningCell]>,
) -> Result<Option<String>, PersistenceError> {
    cells
        .map(|c| serde_json::to_string(c))
        .transpose()
        .map_err(PersistenceError::from)
}

pub fn decode_winning_cells(
    raw: Option<&str>,
) -> Result<Option<Vec<WinningCell>>, PersistenceError> {
    raw.map(|s| serde_json::from_str(s))
        .transpose()
        .map_err(PersistenceError::from)
}
