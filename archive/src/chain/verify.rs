//! Offline consistency check of a stored chain.
//!
//! Works on a snapshot of every record, so it can also diagnose a database
//! written by something other than [`super::ChainManager`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use connect_four::BoardWidth;

use crate::persistence::{GameRecord, RecordId};

/// One violated chain invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainIssue {
    /// Records exist but none has an empty back pointer.
    MissingHead,
    MultipleHeads(Vec<RecordId>),
    /// Records exist but none has an empty forward pointer.
    MissingTail,
    MultipleTails(Vec<RecordId>),
    /// A pointer names a record that does not exist.
    DanglingPointer { id: RecordId, target: RecordId },
    /// `from.next_id == to` but `to.previous_id != from`, or vice versa.
    AsymmetricLink { from: RecordId, to: RecordId },
    /// The forward walk returned to a record it had already visited.
    Cycle { at: RecordId },
    /// Records the forward walk from the head never reached.
    Unreachable(Vec<RecordId>),
    /// Adjacent records whose sequences are not strictly ascending.
    OutOfOrder { previous: RecordId, next: RecordId },
    /// Stored mirror does not match the mirror computed from the sequence.
    MirrorMismatch { id: RecordId },
}

impl fmt::Display for ChainIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHead => write!(f, "no head record"),
            Self::MultipleHeads(ids) => write!(f, "multiple head records: {ids:?}"),
            Self::MissingTail => write!(f, "no tail record"),
            Self::MultipleTails(ids) => write!(f, "multiple tail records: {ids:?}"),
            Self::DanglingPointer { id, target } => {
                write!(f, "record {id} points to missing record {target}")
            }
            Self::AsymmetricLink { from, to } => {
                write!(f, "link {from} -> {to} is not mirrored by a back link")
            }
            Self::Cycle { at } => write!(f, "cycle detected at record {at}"),
            Self::Unreachable(ids) => write!(f, "records not reachable from head: {ids:?}"),
            Self::OutOfOrder { previous, next } => {
                write!(f, "records {previous} -> {next} are out of sequence order")
            }
            Self::MirrorMismatch { id } => write!(f, "record {id} has a stale mirror sequence"),
        }
    }
}

/// Outcome of [`verify_chain`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChainReport {
    pub record_count: usize,
    /// Ids visited walking forward from the head.
    pub walk: Vec<RecordId>,
    pub issues: Vec<ChainIssue>,
}

impl ChainReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for ChainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} records, {} reached from head",
            self.record_count,
            self.walk.len()
        )?;
        if self.issues.is_empty() {
            write!(f, "chain is consistent")
        } else {
            write!(f, "{} issue(s):", self.issues.len())?;
            for issue in &self.issues {
                write!(f, "\n  - {issue}")?;
            }
            Ok(())
        }
    }
}

/// Check every chain invariant over a full snapshot of the records.
pub fn verify_chain(records: &[GameRecord], width: BoardWidth) -> ChainReport {
    let mut report = ChainReport {
        record_count: records.len(),
        ..ChainReport::default()
    };
    if records.is_empty() {
        return report;
    }

    let by_id: HashMap<RecordId, &GameRecord> = records.iter().map(|r| (r.id, r)).collect();

    let heads: Vec<RecordId> = records.iter().filter(|r| r.is_head()).map(|r| r.id).collect();
    let tails: Vec<RecordId> = records.iter().filter(|r| r.is_tail()).map(|r| r.id).collect();
    match heads.len() {
        0 => report.issues.push(ChainIssue::MissingHead),
        1 => {}
        _ => report.issues.push(ChainIssue::MultipleHeads(heads.clone())),
    }
    match tails.len() {
        0 => report.issues.push(ChainIssue::MissingTail),
        1 => {}
        _ => report.issues.push(ChainIssue::MultipleTails(tails)),
    }

    for record in records {
        if record.sequence.mirror(width).ok().as_ref() != Some(&record.mirror_sequence) {
            report
                .issues
                .push(ChainIssue::MirrorMismatch { id: record.id });
        }
        if let Some(next) = record.next_id {
            match by_id.get(&next) {
                None => report.issues.push(ChainIssue::DanglingPointer {
                    id: record.id,
                    target: next,
                }),
                Some(target) if target.previous_id != Some(record.id) => {
                    report.issues.push(ChainIssue::AsymmetricLink {
                        from: record.id,
                        to: next,
                    })
                }
                Some(_) => {}
            }
        }
        if let Some(previous) = record.previous_id {
            match by_id.get(&previous) {
                None => report.issues.push(ChainIssue::DanglingPointer {
                    id: record.id,
                    target: previous,
                }),
                Some(target) if target.next_id != Some(record.id) => {
                    report.issues.push(ChainIssue::AsymmetricLink {
                        from: previous,
                        to: record.id,
                    })
                }
                Some(_) => {}
            }
        }
    }

    let mut visited = HashSet::new();
    let mut cursor = heads.first().and_then(|id| by_id.get(id)).copied();
    while let Some(record) = cursor {
        if !visited.insert(record.id) {
            report.issues.push(ChainIssue::Cycle { at: record.id });
            break;
        }
        report.walk.push(record.id);
        cursor = record.next_id.and_then(|next| by_id.get(&next)).copied();
        if let Some(next) = cursor {
            if next.sequence <= record.sequence {
                report.issues.push(ChainIssue::OutOfOrder {
                    previous: record.id,
                    next: next.id,
                });
            }
        }
    }

    let mut unreachable: Vec<RecordId> = records
        .iter()
        .map(|r| r.id)
        .filter(|id| !visited.contains(id))
        .collect();
    if !unreachable.is_empty() {
        unreachable.sort_unstable();
        report.issues.push(ChainIssue::Unreachable(unreachable));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use connect_four::{GameMode, GameStatus, MoveSequence};

    fn record(
        id: RecordId,
        raw: &str,
        previous_id: Option<RecordId>,
        next_id: Option<RecordId>,
    ) -> GameRecord {
        let sequence = MoveSequence::parse(raw, BoardWidth::STANDARD).unwrap();
        GameRecord {
            id,
            mirror_sequence: sequence.mirror(BoardWidth::STANDARD).unwrap(),
            sequence,
            previous_id,
            next_id,
            mode: GameMode::HumanVsHuman,
            status: GameStatus::Completed,
            winning_cells: None,
            game_number: None,
            created_at: 0,
        }
    }

    fn linked() -> Vec<GameRecord> {
        vec![
            record(1, "222", None, Some(3)),
            record(2, "777", Some(3), None),
            record(3, "555", Some(1), Some(2)),
        ]
    }

    #[test]
    fn empty_chain_is_consistent() {
        let report = verify_chain(&[], BoardWidth::STANDARD);
        assert!(report.is_consistent());
        assert_eq!(report.record_count, 0);
    }

    #[test]
    fn well_formed_chain_walks_in_order() {
        let report = verify_chain(&linked(), BoardWidth::STANDARD);
        assert!(report.is_consistent(), "{report}");
        assert_eq!(report.walk, vec![1, 3, 2]);
    }

    #[test]
    fn detects_asymmetric_link() {
        let mut records = linked();
        records[2].previous_id = Some(2);
        let report = verify_chain(&records, BoardWidth::STANDARD);
        assert!(report
            .issues
            .contains(&ChainIssue::AsymmetricLink { from: 1, to: 3 }));
    }

    #[test]
    fn detects_dangling_pointer_and_unreachable_records() {
        let mut records = linked();
        records[0].next_id = Some(99);
        let report = verify_chain(&records, BoardWidth::STANDARD);
        assert!(report
            .issues
            .contains(&ChainIssue::DanglingPointer { id: 1, target: 99 }));
        assert!(report
            .issues
            .contains(&ChainIssue::Unreachable(vec![2, 3])));
    }

    #[test]
    fn detects_out_of_order_neighbors() {
        let records = vec![
            record(1, "5", None, Some(2)),
            record(2, "3", Some(1), None),
        ];
        let report = verify_chain(&records, BoardWidth::STANDARD);
        assert_eq!(
            report.issues,
            vec![ChainIssue::OutOfOrder {
                previous: 1,
                next: 2
            }]
        );
    }

    #[test]
    fn detects_cycle_and_missing_tail() {
        let records = vec![
            record(1, "1", None, Some(2)),
            record(2, "2", Some(1), Some(3)),
            record(3, "3", Some(2), Some(2)),
        ];
        let report = verify_chain(&records, BoardWidth::STANDARD);
        assert!(report.issues.contains(&ChainIssue::MissingTail));
        assert!(report.issues.contains(&ChainIssue::Cycle { at: 2 }));
    }

    #[test]
    fn detects_multiple_heads() {
        let records = vec![record(1, "1", None, None), record(2, "2", None, None)];
        let report = verify_chain(&records, BoardWidth::STANDARD);
        assert!(report
            .issues
            .contains(&ChainIssue::MultipleHeads(vec![1, 2])));
        assert!(report
            .issues
            .contains(&ChainIssue::MultipleTails(vec![1, 2])));
    }

    #[test]
    fn detects_stale_mirror() {
        let mut records = linked();
        records[1].mirror_sequence = MoveSequence::parse("777", BoardWidth::STANDARD).unwrap();
        let report = verify_chain(&records, BoardWidth::STANDARD);
        assert_eq!(report.issues, vec![ChainIssue::MirrorMismatch { id: 2 }]);
    }

    #[test]
    fn report_display_lists_issues() {
        let records = vec![record(1, "1", None, Some(7))];
        let text = verify_chain(&records, BoardWidth::STANDARD).to_string();
        assert!(text.starts_with("1 records, 1 reached from head"));
        assert!(text.contains("record 1 points to missing record 7"));
    }
}
