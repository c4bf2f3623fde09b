//! Replay cursor over the archive.
//!
//! Holds transient navigation state only: which record is shown, how many of
//! its moves have been played, and whether the mirror image is displayed.
//! Nothing here is persisted. Record-to-record movement goes through
//! [`ChainNavigation`], so the cursor never re-sorts anything.

use connect_four::MoveSequence;

use crate::chain::ChainNavigation;
use crate::persistence::{GameRecord, PersistenceError, RecordId};

pub struct ReplayNavigator<R> {
    chain: R,
    current: Option<GameRecord>,
    /// Moves played so far (0 = empty board, len = final position).
    move_index: usize,
    mirrored: bool,
}

impl<R: ChainNavigation> ReplayNavigator<R> {
    pub fn new(chain: R) -> Self {
        Self {
            chain,
            current: None,
            move_index: 0,
            mirrored: false,
        }
    }

    /// Load a record and rewind to its first move. Returns `false` if the
    /// record does not exist, leaving the cursor where it was.
    pub async fn open(&mut self, id: RecordId) -> Result<bool, PersistenceError> {
        let found = self.chain.get_by_id(id).await?;
        Ok(self.show(found))
    }

    /// Move to the following record in chain order.
    ///
    /// At the tail (or with nothing open) this stays put and returns `false`.
    pub async fn next_record(&mut self) -> Result<bool, PersistenceError> {
        let Some(id) = self.current.as_ref().map(|r| r.id) else {
            return Ok(false);
        };
        let found = self.chain.get_next(id).await?;
        Ok(self.show(found))
    }

    /// Move to the preceding record in chain order.
    ///
    /// At the head (or with nothing open) this stays put and returns `false`.
    pub async fn previous_record(&mut self) -> Result<bool, PersistenceError> {
        let Some(id) = self.current.as_ref().map(|r| r.id) else {
            return Ok(false);
        };
        let found = self.chain.get_previous(id).await?;
        Ok(self.show(found))
    }

    fn show(&mut self, record: Option<GameRecord>) -> bool {
        match record {
            Some(record) => {
                self.current = Some(record);
                self.move_index = 0;
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&GameRecord> {
        self.current.as_ref()
    }

    pub fn move_index(&self) -> usize {
        self.move_index
    }

    fn total_moves(&self) -> usize {
        self.current.as_ref().map_or(0, |r| r.sequence.len())
    }

    /// Play the next move. Returns `false` at the final position.
    pub fn step_forward(&mut self) -> bool {
        if self.move_index < self.total_moves() {
            self.move_index += 1;
            true
        } else {
            false
        }
    }

    /// Take back the last move. Returns `false` at the empty board.
    pub fn step_back(&mut self) -> bool {
        if self.move_index > 0 {
            self.move_index -= 1;
            true
        } else {
            false
        }
    }

    pub fn go_to_start(&mut self) {
        self.move_index = 0;
    }

    pub fn go_to_end(&mut self) {
        self.move_index = self.total_moves();
    }

    /// Flip between the sequence as played and its mirror. Returns the new state.
    pub fn toggle_mirror(&mut self) -> bool {
        self.mirrored = !self.mirrored;
        self.mirrored
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Full sequence of the open record, as played or mirrored.
    pub fn displayed_sequence(&self) -> Option<&MoveSequence> {
        self.current
            .as_ref()
            .map(|r| r.display_sequence(self.mirrored))
    }

    /// Moves played up to the cursor.
    pub fn played_moves(&self) -> &str {
        self.displayed_sequence()
            .map_or("", |s| s.prefix(self.move_index))
    }

    /// Column (1-indexed) of the most recently played move.
    pub fn current_column(&self) -> Option<u8> {
        let index = self.move_index.checked_sub(1)?;
        self.displayed_sequence()?.columns().nth(index)
    }
}
