//! Core Connect Four types shared by the archive.
//!
//! Everything in this crate is pure: move sequences, the mirror key used for
//! symmetric-duplicate detection, and the small enums describing a recorded
//! game. No I/O happens here.

pub mod sequence;
pub mod types;

pub use sequence::{mirror, BoardWidth, MoveSequence, SequenceError};
pub use types::{GameMode, GameStatus, WinningCell};
