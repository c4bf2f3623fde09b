//! Move sequences and their mirror keys.
//!
//! A game is recorded as the ordered list of columns played, one digit per
//! move, columns numbered from 1. Reflecting the board across its vertical
//! center maps column `d` to `(width + 1) - d`; applying that to every move
//! (without reordering) yields the mirror sequence, which is how symmetric
//! duplicates are detected.

use std::fmt;

use serde::Serialize;

/// Widest board a single-digit column encoding can describe.
const MAX_COLUMNS: u8 = 9;

/// Width of the standard 8x9 board.
const STANDARD_COLUMNS: u8 = 9;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("Move sequence is empty")]
    Empty,
    #[error("Invalid column {found:?} at move {position} (board has {columns} columns)")]
    InvalidColumn {
        position: usize,
        found: char,
        columns: u8,
    },
    #[error("Unsupported board width {0} (expected 1..=9)")]
    UnsupportedWidth(u8),
}

/// Number of columns on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardWidth(u8);

impl BoardWidth {
    pub const STANDARD: Self = Self(STANDARD_COLUMNS);

    pub fn new(columns: u8) -> Result<Self, SequenceError> {
        if (1..=MAX_COLUMNS).contains(&columns) {
            Ok(Self(columns))
        } else {
            Err(SequenceError::UnsupportedWidth(columns))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Column reflected across the vertical center line.
    fn reflect(self, column: u8) -> u8 {
        (self.0 + 1) - column
    }

    /// Parse one move character as a 1-indexed column on this board.
    fn column_of(self, position: usize, found: char) -> Result<u8, SequenceError> {
        match found.to_digit(10) {
            Some(d) if d >= 1 && d <= u32::from(self.0) => Ok(d as u8),
            _ => Err(SequenceError::InvalidColumn {
                position,
                found,
                columns: self.0,
            }),
        }
    }
}

impl Default for BoardWidth {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl fmt::Display for BoardWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the mirror of a raw move string.
///
/// Every character must be a column digit in `1..=total_columns`. Move order
/// is preserved; only the columns are reflected. An empty input mirrors to an
/// empty output.
pub fn mirror(sequence: &str, total_columns: u8) -> Result<String, SequenceError> {
    let width = BoardWidth::new(total_columns)?;
    sequence
        .chars()
        .enumerate()
        .map(|(position, c)| {
            width
                .column_of(position, c)
                .map(|column| digit_char(width.reflect(column)))
        })
        .collect()
}

fn digit_char(column: u8) -> char {
    char::from(b'0' + column)
}

/// A validated, non-empty move sequence.
///
/// Ordering is plain lexicographic order over the digit string: the first
/// differing move decides, and a strict prefix sorts before its extensions.
/// Since every move is a single ASCII digit this is exactly byte order, which
/// is also how SQLite's `BINARY` collation compares the stored text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MoveSequence(String);

impl MoveSequence {
    /// Validate `raw` against the board width.
    pub fn parse(raw: &str, width: BoardWidth) -> Result<Self, SequenceError> {
        if raw.is_empty() {
            return Err(SequenceError::Empty);
        }
        for (position, c) in raw.chars().enumerate() {
            width.column_of(position, c)?;
        }
        Ok(Self(raw.to_string()))
    }

    /// Validate `raw` without knowing the board; any column `1..=9` is accepted.
    pub fn parse_digits(raw: &str) -> Result<Self, SequenceError> {
        Self::parse(raw, BoardWidth(MAX_COLUMNS))
    }

    /// The mirror image of this sequence on a board of `width` columns.
    ///
    /// Fails if `width` is narrower than a column already played.
    pub fn mirror(&self, width: BoardWidth) -> Result<MoveSequence, SequenceError> {
        mirror(&self.0, width.get()).map(MoveSequence)
    }

    /// True when the sequence is its own mirror (every move in the center column).
    pub fn is_self_mirror(&self, width: BoardWidth) -> bool {
        self.mirror(width).is_ok_and(|m| m == *self)
    }

    /// Columns played, in move order.
    pub fn columns(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.bytes().map(|b| b - b'0')
    }

    /// The first `moves` moves as text (clamped to the sequence length).
    pub fn prefix(&self, moves: usize) -> &str {
        &self.0[..moves.min(self.0.len())]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for MoveSequence {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seq(raw: &str) -> MoveSequence {
        MoveSequence::parse(raw, BoardWidth::STANDARD).unwrap()
    }

    #[test]
    fn mirror_matches_documented_examples() {
        assert_eq!(mirror("125", 9).unwrap(), "985");
        assert_eq!(mirror("431", 9).unwrap(), "679");
        assert_eq!(mirror("125431", 9).unwrap(), "985679");
    }

    #[test]
    fn mirror_on_narrow_board() {
        assert_eq!(mirror("1234567", 7).unwrap(), "7654321");
        assert_eq!(mirror("44", 7).unwrap(), "44");
    }

    #[test]
    fn mirror_of_empty_is_empty() {
        assert_eq!(mirror("", 9).unwrap(), "");
    }

    #[test]
    fn mirror_rejects_out_of_range_column() {
        assert_eq!(
            mirror("128", 7),
            Err(SequenceError::InvalidColumn {
                position: 2,
                found: '8',
                columns: 7
            })
        );
        assert!(matches!(
            mirror("102", 9),
            Err(SequenceError::InvalidColumn { position: 1, found: '0', .. })
        ));
        assert!(matches!(
            mirror("1a", 9),
            Err(SequenceError::InvalidColumn { found: 'a', .. })
        ));
    }

    #[test]
    fn mirror_rejects_unsupported_width() {
        assert_eq!(mirror("1", 0), Err(SequenceError::UnsupportedWidth(0)));
        assert_eq!(mirror("1", 10), Err(SequenceError::UnsupportedWidth(10)));
    }

    #[test]
    fn parse_rejects_empty() {
        assert_eq!(
            MoveSequence::parse("", BoardWidth::STANDARD),
            Err(SequenceError::Empty)
        );
    }

    #[test]
    fn parse_validates_against_width() {
        let narrow = BoardWidth::new(4).unwrap();
        assert!(MoveSequence::parse("1234", narrow).is_ok());
        assert!(MoveSequence::parse("1235", narrow).is_err());
    }

    #[test]
    fn ordering_is_lexicographic_with_prefix_first() {
        assert!(seq("125") < seq("431"));
        assert!(seq("431") < seq("777"));
        assert!(seq("12") < seq("125"));
        assert!(seq("2") > seq("1999"));
    }

    #[test]
    fn self_mirror_detection() {
        assert!(seq("5").is_self_mirror(BoardWidth::STANDARD));
        assert!(seq("555").is_self_mirror(BoardWidth::STANDARD));
        assert!(!seq("15").is_self_mirror(BoardWidth::STANDARD));
    }

    #[test]
    fn typed_mirror_rejects_narrower_board() {
        let s = seq("19");
        assert!(s.mirror(BoardWidth::new(5).unwrap()).is_err());
        assert_eq!(s.mirror(BoardWidth::STANDARD).unwrap().as_str(), "91");
    }

    #[test]
    fn prefix_is_clamped() {
        let s = seq("4312");
        assert_eq!(s.prefix(0), "");
        assert_eq!(s.prefix(2), "43");
        assert_eq!(s.prefix(10), "4312");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&seq("431")).unwrap();
        assert_eq!(json, "\"431\"");
    }

    fn width_and_sequence() -> impl Strategy<Value = (u8, String)> {
        (1u8..=9).prop_flat_map(|w| {
            let digits = proptest::collection::vec(1u8..=w, 1..24);
            (Just(w), digits.prop_map(|d| d.into_iter().map(digit_char).collect()))
        })
    }

    proptest! {
        #[test]
        fn mirror_is_an_involution((width, raw) in width_and_sequence()) {
            let once = mirror(&raw, width).unwrap();
            let twice = mirror(&once, width).unwrap();
            prop_assert_eq!(twice, raw);
        }

        #[test]
        fn typed_mirror_agrees_with_raw_mirror((width, raw) in width_and_sequence()) {
            let w = BoardWidth::new(width).unwrap();
            let typed = MoveSequence::parse(&raw, w).unwrap().mirror(w).unwrap();
            prop_assert_eq!(typed.as_str(), mirror(&raw, width).unwrap());
        }

        #[test]
        fn ordering_matches_string_ordering(a in "[1-9]{1,12}", b in "[1-9]{1,12}") {
            let sa = MoveSequence::parse(&a, BoardWidth::STANDARD).unwrap();
            let sb = MoveSequence::parse(&b, BoardWidth::STANDARD).unwrap();
            prop_assert_eq!(sa.cmp(&sb), a.as_str().cmp(b.as_str()));
        }
    }
}
