//! Persistent archive of Connect Four games.
//!
//! Games are stored in SQLite and kept in a doubly-linked chain ordered by
//! their move sequence, with mirror-image duplicates rejected on insert.
//!
//! - [`persistence`]: record types and the SQLite store.
//! - [`chain`]: the chain manager, sole owner of the chain pointers.
//! - [`replay`]: a cursor for stepping through stored games.
//! - [`config`]: environment-driven settings.

pub mod chain;
pub mod config;
pub mod persistence;
pub mod replay;

pub use chain::{ChainError, ChainManager, ChainNavigation};
pub use persistence::sqlite::Database;
pub use persistence::{GameMetadata, GameRecord, PersistenceError, RecordId, RecordOrder};
pub use replay::ReplayNavigator;
