//! Command-line front end for the game archive.
//!
//! Opens the database (see [`c4_archive::config`] for where it lives), runs a
//! single command against the chain, and closes the database again.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use connect_four::{BoardWidth, GameMode, GameStatus, WinningCell};

use c4_archive::chain::ChainManager;
use c4_archive::config;
use c4_archive::{Database, GameMetadata, GameRecord, RecordId, RecordOrder, ReplayNavigator};

#[derive(Parser)]
#[command(name = "c4-archive", about = "Archive of Connect Four games ordered by move sequence")]
struct Cli {
    /// Database file. Defaults to `C4_ARCHIVE_DB_PATH` or the data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Board width used to validate and mirror sequences (1-9).
    #[arg(long, global = true)]
    columns: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a game given as a string of 1-indexed columns, e.g. `4431256`.
    Insert {
        sequence: String,
        #[arg(long, default_value_t = GameMode::HumanVsHuman)]
        mode: GameMode,
        #[arg(long, default_value_t = GameStatus::Completed)]
        status: GameStatus,
        #[arg(long)]
        game_number: Option<i64>,
        /// Winning line as JSON `[[row,col],...]`, zero-based.
        #[arg(long)]
        winning_cells: Option<String>,
    },
    /// Set how a stored game ended.
    Conclude {
        id: RecordId,
        #[arg(long, default_value_t = GameStatus::Completed)]
        status: GameStatus,
        /// Winning line as JSON `[[row,col],...]`, zero-based.
        #[arg(long)]
        winning_cells: Option<String>,
    },
    /// Delete a record and relink its neighbors.
    Delete { id: RecordId },
    /// Show one record with its neighbors.
    Show {
        id: RecordId,
        /// Display the mirrored sequence.
        #[arg(long)]
        mirror: bool,
    },
    /// List every record.
    List {
        /// Insertion order instead of chain order.
        #[arg(long)]
        by_id: bool,
    },
    /// Walk the chain and report any inconsistency.
    Verify,
    /// Step through a record's moves one by one.
    Replay {
        id: RecordId,
        #[arg(long)]
        mirror: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use tracing_subscriber::fmt::format::FmtSpan;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let width = match cli.columns {
        Some(columns) => BoardWidth::new(columns)?,
        None => config::get_board_width(),
    };
    let db_path = cli.db.unwrap_or_else(config::get_database_path);
    tracing::debug!(db = %db_path.display(), %width, "Using archive");

    let db = Database::open(&db_path)
        .await
        .with_context(|| format!("opening {}", db_path.display()))?;
    let chain = ChainManager::new(&db, width);

    let result = run(&chain, cli.command).await;
    db.close().await;
    result
}

async fn run(chain: &ChainManager, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Insert {
            sequence,
            mode,
            status,
            game_number,
            winning_cells,
        } => {
            let winning_cells = parse_winning_cells(winning_cells)?;
            let metadata = GameMetadata {
                mode,
                status,
                winning_cells,
                game_number,
            };
            let id = chain.insert(&sequence, metadata).await?;
            println!("Inserted record {id}");
        }
        Commands::Conclude {
            id,
            status,
            winning_cells,
        } => {
            let winning_cells = parse_winning_cells(winning_cells)?;
            chain
                .update_outcome(id, status, winning_cells.as_deref())
                .await?;
            println!("Record {id} is now {status}");
        }
        Commands::Delete { id } => {
            if chain.delete(id).await? {
                println!("Deleted record {id}");
            } else {
                println!("No record {id}");
            }
        }
        Commands::Show { id, mirror } => {
            let Some(record) = chain.get_by_id(id).await? else {
                anyhow::bail!("no record {id}");
            };
            print_record(&record, mirror);
            let previous = chain.get_previous(id).await?;
            let next = chain.get_next(id).await?;
            println!("  previous : {}", describe(previous.as_ref()));
            println!("  next     : {}", describe(next.as_ref()));
        }
        Commands::List { by_id } => {
            let order = if by_id {
                RecordOrder::Id
            } else {
                RecordOrder::Sequence
            };
            let records = chain.list(order).await?;
            println!("{} records", records.len());
            for record in &records {
                print_record(record, false);
            }
        }
        Commands::Verify => {
            let report = chain.verify().await?;
            let records = chain.list(RecordOrder::Id).await?;
            let walk: Vec<String> = report
                .walk
                .iter()
                .filter_map(|id| records.iter().find(|r| r.id == *id))
                .map(|r| format!("{}({})", r.id, r.sequence))
                .collect();
            if !walk.is_empty() {
                println!("{}", walk.join(" -> "));
            }
            println!("{report}");
            if !report.is_consistent() {
                anyhow::bail!("chain is inconsistent");
            }
        }
        Commands::Replay { id, mirror } => {
            let mut nav = ReplayNavigator::new(chain);
            if !nav.open(id).await? {
                anyhow::bail!("no record {id}");
            }
            if mirror {
                nav.toggle_mirror();
            }
            while nav.step_forward() {
                let column = nav.current_column().unwrap_or_default();
                println!("{:>3}. column {column}  [{}]", nav.move_index(), nav.played_moves());
            }
        }
    }
    Ok(())
}

fn parse_winning_cells(raw: Option<String>) -> anyhow::Result<Option<Vec<WinningCell>>> {
    raw.map(|raw| serde_json::from_str::<Vec<WinningCell>>(&raw))
        .transpose()
        .context("parsing --winning-cells")
}

fn print_record(record: &GameRecord, mirror: bool) {
    println!(
        "#{} {} (mirror {}) {} {}{}",
        record.id,
        record.display_sequence(mirror),
        record.display_sequence(!mirror),
        record.mode,
        record.status,
        record
            .game_number
            .map(|n| format!(" game {n}"))
            .unwrap_or_default(),
    );
    if let Some(cells) = &record.winning_cells {
        let cells: Vec<String> = cells
            .iter()
            .map(|c| format!("({},{})", c.row, c.column))
            .collect();
        println!("  winning  : {}", cells.join(" "));
    }
    println!(
        "  links    : {} <- -> {}",
        link(record.previous_id),
        link(record.next_id)
    );
}

fn link(id: Option<RecordId>) -> String {
    id.map_or_else(|| "-".to_string(), |id| id.to_string())
}

fn describe(record: Option<&GameRecord>) -> String {
    record.map_or_else(
        || "none".to_string(),
        |r| format!("#{} {}", r.id, r.sequence),
    )
}
