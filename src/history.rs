//! Bounded history of ended polls
//!
//! This module keeps the terminal snapshots of ended polls, most recent
//! first. The log is bounded: once it exceeds its capacity the oldest
//! entries are evicted. Entries are immutable after append.

use std::collections::VecDeque;

use serde::Serialize;
use web_time::SystemTime;

use crate::poll::PollId;

/// Immutable terminal snapshot of a finished poll
///
/// Captures everything clients need to review a past poll: the question,
/// its options, every recorded answer value, and how the poll ended.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Identifier of the poll this entry snapshots
    id: PollId,
    /// The question text
    question: String,
    /// The ordered answer options
    options: Vec<String>,
    /// All recorded answer values at the moment the poll ended
    answers: Vec<String>,
    /// When the poll ended
    ended_at: SystemTime,
    /// Number of recorded answers
    total_responses: usize,
    /// Whether the poll was ended by a manual reset rather than timeout
    manually_ended: bool,
}

impl HistoryEntry {
    /// Creates a terminal snapshot of a poll that just ended
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier of the ended poll
    /// * `question` - The question text
    /// * `options` - The ordered answer options
    /// * `answers` - All recorded answer values at poll end
    /// * `manually_ended` - `true` for manual reset, `false` for timeout
    pub fn new(
        id: PollId,
        question: String,
        options: Vec<String>,
        answers: Vec<String>,
        manually_ended: bool,
    ) -> Self {
        let total_responses = answers.len();
        Self {
            id,
            question,
            options,
            answers,
            ended_at: SystemTime::now(),
            total_responses,
            manually_ended,
        }
    }

    /// Returns the identifier of the poll this entry snapshots
    pub fn id(&self) -> PollId {
        self.id
    }

    /// Returns the question text
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Returns the ordered answer options
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Returns all recorded answer values at the moment the poll ended
    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    /// Returns when the poll ended
    pub fn ended_at(&self) -> SystemTime {
        self.ended_at
    }

    /// Returns the number of recorded answers
    pub fn total_responses(&self) -> usize {
        self.total_responses
    }

    /// Returns whether the poll was ended by a manual reset
    pub fn manually_ended(&self) -> bool {
        self.manually_ended
    }
}

/// Bounded most-recent-first log of ended polls
#[derive(Debug, Default)]
pub struct HistoryLog {
    /// Entries ordered newest first
    entries: VecDeque<HistoryEntry>,
}

impl HistoryLog {
    /// Appends a terminal snapshot at the front of the log
    ///
    /// If the log grows beyond [`crate::constants::history::CAPACITY`],
    /// the oldest entries are evicted from the tail.
    ///
    /// # Arguments
    ///
    /// * `entry` - The snapshot to record
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(crate::constants::history::CAPACITY);
    }

    /// Returns the number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over retained entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Returns a read-only snapshot of all retained entries, newest first
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn entry(n: u64) -> HistoryEntry {
        HistoryEntry::new(
            PollId::default(),
            format!("Question {n}"),
            vec!["A".to_string(), "B".to_string()],
            vec!["A".to_string()],
            false,
        )
    }

    #[test]
    fn test_append_newest_first() {
        let mut log = HistoryLog::default();
        log.append(entry(1));
        log.append(entry(2));

        let snapshot = log.snapshot();
        assert_eq!(snapshot[0].question(), "Question 2");
        assert_eq!(snapshot[1].question(), "Question 1");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = HistoryLog::default();
        for n in 0..=crate::constants::history::CAPACITY as u64 {
            log.append(entry(n));
        }

        assert_eq!(log.len(), crate::constants::history::CAPACITY);

        let snapshot = log.snapshot();
        // the 51st append sits at the front, the very first entry is gone
        assert_eq!(
            snapshot[0].question(),
            format!("Question {}", crate::constants::history::CAPACITY)
        );
        assert!(snapshot.iter().all(|e| e.question() != "Question 0"));
    }

    #[test]
    fn test_total_responses_matches_answers() {
        let e = HistoryEntry::new(
            PollId::default(),
            "Q".to_string(),
            vec!["A".to_string(), "B".to_string()],
            vec!["A".to_string(), "B".to_string(), "A".to_string()],
            true,
        );
        assert_eq!(e.total_responses(), 3);
        assert!(e.manually_ended());
    }
}
