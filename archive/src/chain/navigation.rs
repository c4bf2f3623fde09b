//! Read-only view of the chain for consumers such as the replay navigator.
//!
//! Methods return `impl Future + Send` rather than using `async fn` so that
//! the futures are guaranteed `Send` for callers that spawn them.

use std::future::Future;

use crate::persistence::{GameRecord, PersistenceError, RecordId};

/// Pointer-following lookups over the chain.
///
/// An absent neighbor is `Ok(None)`: "no record in that direction", not an
/// error.
pub trait ChainNavigation: Send + Sync {
    fn get_by_id(
        &self,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<GameRecord>, PersistenceError>> + Send;
    fn get_previous(
        &self,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<GameRecord>, PersistenceError>> + Send;
    fn get_next(
        &self,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<GameRecord>, PersistenceError>> + Send;
}

impl<T: ChainNavigation> ChainNavigation for &T {
    fn get_by_id(
        &self,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<GameRecord>, PersistenceError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_previous(
        &self,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<GameRecord>, PersistenceError>> + Send {
        (**self).get_previous(id)
    }

    fn get_next(
        &self,
        id: RecordId,
    ) -> impl Future<Output = Result<Option<GameRecord>, PersistenceError>> + Send {
        (**self).get_next(id)
    }
}
