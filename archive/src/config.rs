//! Configuration for the game archive.
//!
//! Every value has a compiled default and can be overridden through an
//! environment variable. Command-line flags in `main.rs` take precedence over
//! both.
//!
//! Data directory precedence:
//! 1. `C4_ARCHIVE_DATA_DIR` environment variable
//! 2. `~/.config/c4-archive/data` (production default)
//! 3. `./data` (fallback for development)

use std::path::PathBuf;

use connect_four::BoardWidth;

const DEFAULT_CONFIG_DIR: &str = ".config/c4-archive/data";
const DEV_DATA_DIR: &str = "./data";
const DATABASE_FILE: &str = "archive.db";

/// Get the data directory for persistence.
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("C4_ARCHIVE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Get the SQLite database file.
///
/// Priority:
/// 1. `C4_ARCHIVE_DB_PATH` env variable if set
/// 2. `archive.db` inside [`get_data_dir`]
pub fn get_database_path() -> PathBuf {
    if let Ok(path) = std::env::var("C4_ARCHIVE_DB_PATH") {
        return PathBuf::from(path);
    }

    get_data_dir().join(DATABASE_FILE)
}

/// Get the board width used to validate and mirror sequences.
///
/// Priority:
/// 1. `C4_ARCHIVE_COLUMNS` env variable if set and a valid width (1..=9)
/// 2. 9 columns as fallback
pub fn get_board_width() -> BoardWidth {
    match std::env::var("C4_ARCHIVE_COLUMNS") {
        Ok(raw) => parse_board_width(&raw),
        Err(_) => BoardWidth::default(),
    }
}

fn parse_board_width(raw: &str) -> BoardWidth {
    match raw.trim().parse::<u8>().map(BoardWidth::new) {
        Ok(Ok(width)) => width,
        _ => {
            tracing::warn!(value = raw, "Ignoring invalid C4_ARCHIVE_COLUMNS");
            BoardWidth::default()
        }
    }
}
