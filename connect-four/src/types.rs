//! Game metadata stored alongside a move sequence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who played the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameMode {
    #[default]
    HumanVsHuman,
    HumanVsAi,
    AiVsAi,
}

/// How far the game got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameStatus {
    InProgress,
    #[default]
    Completed,
    Abandoned,
}

/// One cell of a winning alignment, zero-based `(row, column)`.
///
/// Serialized as a `[row, column]` pair so a full line reads as
/// `[[5,0],[5,1],[5,2],[5,3]]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(u8, u8)", into = "(u8, u8)")]
pub struct WinningCell {
    pub row: u8,
    pub column: u8,
}

impl WinningCell {
    pub fn new(row: u8, column: u8) -> Self {
        Self { row, column }
    }
}

impl From<(u8, u8)> for WinningCell {
    fn from((row, column): (u8, u8)) -> Self {
        Self { row, column }
    }
}

impl From<WinningCell> for (u8, u8) {
    fn from(cell: WinningCell) -> Self {
        (cell.row, cell.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl GameMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HumanVsHuman => "HumanVsHuman",
            Self::HumanVsAi => "HumanVsAi",
            Self::AiVsAi => "AiVsAi",
        }
    }
}

impl FromStr for GameMode {
    type Err = ParseEnumError;

    /// Accepts the stored names as well as the short `PvP` / `PvAI` / `AIvsAI`
    /// labels, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "humanvshuman" | "pvp" => Ok(Self::HumanVsHuman),
            "humanvsai" | "pvai" => Ok(Self::HumanVsAi),
            "aivsai" => Ok(Self::AiVsAi),
            _ => Err(ParseEnumError {
                kind: "game mode",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
            Self::Abandoned => "Abandoned",
        }
    }
}

impl FromStr for GameStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inprogress" | "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(ParseEnumError {
                kind: "game status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_stored_and_short_names() {
        for mode in [GameMode::HumanVsHuman, GameMode::HumanVsAi, GameMode::AiVsAi] {
            assert_eq!(mode.as_str().parse::<GameMode>().unwrap(), mode);
        }
        assert_eq!("PvP".parse::<GameMode>().unwrap(), GameMode::HumanVsHuman);
        assert_eq!("PvAI".parse::<GameMode>().unwrap(), GameMode::HumanVsAi);
        assert_eq!("AIvsAI".parse::<GameMode>().unwrap(), GameMode::AiVsAi);
        assert!("Solo".parse::<GameMode>().is_err());
    }

    #[test]
    fn status_parses_stored_names() {
        for status in [
            GameStatus::InProgress,
            GameStatus::Completed,
            GameStatus::Abandoned,
        ] {
            assert_eq!(status.as_str().parse::<GameStatus>().unwrap(), status);
        }
        assert_eq!(
            "in-progress".parse::<GameStatus>().unwrap(),
            GameStatus::InProgress
        );
    }

    #[test]
    fn parse_error_names_the_kind() {
        let err = "Draw".parse::<GameStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown game status: \"Draw\"");
    }

    #[test]
    fn winning_cells_serialize_as_pairs() {
        let line = vec![WinningCell::new(5, 0), WinningCell::new(4, 1)];
        let json = serde_json::to_string(&line).unwrap();
        assert_eq!(json, "[[5,0],[4,1]]");
        let back: Vec<WinningCell> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, line);
    }
}
