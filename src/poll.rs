//! Poll session state machine
//!
//! This module implements the single shared poll of the room: creating a
//! question with options and a time limit, collecting at most one answer
//! per connection, and the two terminal transitions (timeout and manual
//! reset) that snapshot the poll into history. Result updates are fanned
//! out to every connected client on each accepted submission.

use std::{
    collections::HashMap,
    time::{self, Duration},
};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::SystemTime;

use crate::{
    history::HistoryEntry,
    roster::{Id, Roster},
    session::Tunnel,
};

type ValidationResult = garde::Result;

/// Validates that a duration falls within specified bounds
///
/// # Arguments
///
/// * `field` - Name of the field being validated (for error messages)
/// * `val` - The duration value to validate
///
/// # Returns
///
/// `Ok(())` if the duration is valid, `Err` with descriptive message if not
fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    field: &'static str,
    val: &Duration,
) -> ValidationResult {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "{field} is outside of the bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Validates the time limit of a poll
fn validate_timer(val: &Duration) -> ValidationResult {
    validate_duration::<{ crate::constants::poll::MIN_TIMER }, { crate::constants::poll::MAX_TIMER }>(
        "timer", val,
    )
}

/// Timer duration applied when a poll config omits one
fn default_timer() -> Duration {
    Duration::from_secs(crate::constants::poll::DEFAULT_TIMER)
}

/// A monotonically increasing identifier for polls within one room
///
/// Every created poll gets a fresh ID. Scheduled expiry alarms carry the
/// ID of the poll they were armed for, so an alarm that outlives its poll
/// (because the poll was reset or superseded) is recognized as stale and
/// ignored. Ended polls keep their ID as the history entry ID.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct PollId(u64);

impl PollId {
    /// Returns the next poll ID after this one
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Configuration for a new poll
///
/// This struct defines the parameters of a create-question action. It is
/// deserialized from the wire and should be validated by the embedding
/// server before being handed to the room.
#[serde_with::serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PollConfig {
    /// The question text shown to all participants
    #[garde(length(min = crate::constants::poll::MIN_QUESTION_LENGTH, max = crate::constants::poll::MAX_QUESTION_LENGTH))]
    question: String,
    /// The ordered answer options participants pick from
    #[garde(
        length(min = crate::constants::poll::MIN_OPTION_COUNT, max = crate::constants::poll::MAX_OPTION_COUNT),
        inner(length(max = crate::constants::poll::MAX_OPTION_LENGTH))
    )]
    options: Vec<String>,
    /// How long the poll accepts answers before it force-ends
    #[garde(custom(|v, _| validate_timer(v)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    #[serde(default = "default_timer")]
    timer: Duration,
}

impl PollConfig {
    /// Creates a poll configuration
    ///
    /// # Arguments
    ///
    /// * `question` - The question text
    /// * `options` - The ordered answer options
    /// * `timer` - How long the poll accepts answers
    pub fn new(question: String, options: Vec<String>, timer: Duration) -> Self {
        Self {
            question,
            options,
            timer,
        }
    }
}

/// The current poll of the room
///
/// At most one poll exists at a time; the room is idle when there is none.
#[derive(Debug, Clone, Serialize)]
pub struct Poll {
    /// Identifier of this poll, also used to guard its expiry alarm
    id: PollId,
    /// The question text
    question: String,
    /// The ordered answer options
    options: Vec<String>,
    /// The full timer duration this poll was created with
    timer: Duration,
    /// When the poll was created
    created_at: SystemTime,
    /// When the poll will be force-ended by the timer
    expires_at: SystemTime,
}

impl Poll {
    /// Returns the identifier of this poll
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

    /// Returns the full timer duration of this poll
    pub fn timer(&self) -> Duration {
        self.timer
    }

    /// Returns when the poll was created
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Returns when the poll will be force-ended by the timer
    pub fn expires_at(&self) -> SystemTime {
        self.expires_at
    }

    /// Returns the time left until the poll force-ends
    ///
    /// Derived from the expiry deadline, never the full original duration,
    /// so late joiners see the actual remaining time.
    pub fn remaining(&self) -> Duration {
        self.expires_at
            .duration_since(SystemTime::now())
            .unwrap_or_default()
    }
}

/// A single recorded answer
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The submitted answer value
    value: String,
    /// When the answer was received
    submitted_at: SystemTime,
}

impl Answer {
    /// Returns the submitted answer value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns when the answer was received
    pub fn submitted_at(&self) -> SystemTime {
        self.submitted_at
    }
}

/// Errors reported to a connection whose submission was rejected
///
/// Rejections never mutate shared state; they are terminal for that single
/// request and reported only to the originating connection.
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// Submission arrived while no poll was active
    #[error("No active poll to submit an answer to.")]
    NoActivePoll,
    /// The connection already has a recorded answer for the current poll
    #[error("You have already submitted an answer for this poll.")]
    DuplicateSubmission,
}

/// Update messages broadcast or targeted during the poll lifecycle
#[serde_with::serde_as]
#[derive(Debug, Serialize, Clone)]
pub enum UpdateMessage {
    /// Announces a newly created poll to all clients
    NewQuestion {
        /// The question text
        question: String,
        /// The ordered answer options
        options: Vec<String>,
        /// The full timer duration of the poll
        #[serde_as(as = "serde_with::DurationSeconds<u64>")]
        timer: Duration,
    },
    /// Tells all clients to clear displayed results, sent immediately
    /// before each new question
    ClearResults,
    /// Live aggregate results, broadcast on each accepted submission and
    /// on disconnect while a poll is active
    PollResults {
        /// The question text
        question: String,
        /// The ordered answer options
        options: Vec<String>,
        /// All recorded answer values in submission order
        answers: Vec<String>,
    },
    /// Final results of a poll that ended by timeout
    #[serde(rename_all = "camelCase")]
    PollEnded {
        /// The question text
        question: String,
        /// The ordered answer options
        options: Vec<String>,
        /// All recorded answer values at the moment the poll ended
        final_answers: Vec<String>,
    },
    /// Announces that the poll was manually reset
    PollReset,
    /// (TARGETED) Reports a rejected submission to its sender
    SubmissionError {
        /// Human-readable description of the rejection
        message: String,
    },
}

/// Sync message catching a late joiner up with the active poll
#[serde_with::serde_as]
#[derive(Debug, Serialize, Clone)]
pub enum SyncMessage {
    /// The currently active question with its remaining time
    Question {
        /// The question text
        question: String,
        /// The ordered answer options
        options: Vec<String>,
        /// Time left until the poll force-ends
        #[serde_as(as = "serde_with::DurationSeconds<u64>")]
        remaining: Duration,
    },
}

/// Alarm messages for timed poll events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Force-ends the poll it was armed for when it fires
    Expire {
        /// The poll this alarm was armed for
        poll: PollId,
    },
}

/// The poll state machine of one room
///
/// Holds the current poll (if any) and the answer set keyed by connection
/// ID, guaranteeing at most one answer per connection. All transitions
/// announce their effects through the roster.
#[derive(Debug, Default)]
pub struct PollSession {
    /// The currently active poll, `None` when idle
    current: Option<Poll>,
    /// Recorded answers keyed by the submitting connection
    answers: HashMap<Id, Answer>,
    /// Submitting connections in arrival order
    answer_order: Vec<Id>,
    /// The ID the next created poll will receive
    next_id: PollId,
}

impl PollSession {
    /// Returns the currently active poll, if any
    pub fn current(&self) -> Option<&Poll> {
        self.current.as_ref()
    }

    /// Returns whether a poll is currently active
    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Returns the number of recorded answers for the current poll
    pub fn answer_count(&self) -> usize {
        self.answer_order.len()
    }

    /// All recorded answer values in submission order
    fn answer_values(&self) -> Vec<String> {
        self.answer_order
            .iter()
            .filter_map(|id| self.answers.get(id).map(|answer| answer.value.clone()))
            .collect_vec()
    }

    /// Clears the poll and all recorded answers
    fn clear(&mut self) {
        self.current = None;
        self.answers.clear();
        self.answer_order.clear();
    }

    /// Creates a new poll, discarding any active one
    ///
    /// Valid from any state: an active poll superseded this way is
    /// discarded without a history entry. Effects in order: broadcast
    /// `ClearResults`, replace the poll and clear all answers, arm the
    /// expiry alarm for the new poll, broadcast `NewQuestion`. The fresh
    /// [`PollId`] carried by the alarm makes any previously armed alarm
    /// stale.
    ///
    /// # Arguments
    ///
    /// * `config` - The question, options, and timer of the new poll
    /// * `roster` - Connection roster used for broadcasting
    /// * `schedule_message` - Function to schedule the expiry alarm
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    pub fn create<
        T: Tunnel,
        F: Fn(Id) -> Option<T>,
        S: FnMut(crate::AlarmMessage, time::Duration),
    >(
        &mut self,
        config: PollConfig,
        roster: &Roster,
        mut schedule_message: S,
        tunnel_finder: F,
    ) {
        roster.announce(&UpdateMessage::ClearResults.into(), &tunnel_finder);

        let PollConfig {
            question,
            options,
            timer,
        } = config;

        let id = self.next_id;
        self.next_id = self.next_id.next();

        let created_at = SystemTime::now();
        self.clear();
        self.current = Some(Poll {
            id,
            question: question.clone(),
            options: options.clone(),
            timer,
            created_at,
            expires_at: created_at + timer,
        });

        schedule_message(AlarmMessage::Expire { poll: id }.into(), timer);

        roster.announce(
            &UpdateMessage::NewQuestion {
                question,
                options,
                timer,
            }
            .into(),
            &tunnel_finder,
        );
    }

    /// Records an answer for a connection and broadcasts updated results
    ///
    /// Results are visible to everyone immediately: each accepted
    /// submission triggers a `PollResults` broadcast to all clients.
    ///
    /// # Arguments
    ///
    /// * `watcher` - The submitting connection
    /// * `value` - The submitted answer value
    /// * `roster` - Connection roster used for broadcasting
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::NoActivePoll`] when the room is idle, or
    /// [`SubmitError::DuplicateSubmission`] when the connection already
    /// answered the current poll. The first recorded value is never
    /// overwritten.
    pub fn submit<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        watcher: Id,
        value: String,
        roster: &Roster,
        tunnel_finder: F,
    ) -> Result<(), SubmitError> {
        if !self.is_active() {
            return Err(SubmitError::NoActivePoll);
        }

        if self.answers.contains_key(&watcher) {
            return Err(SubmitError::DuplicateSubmission);
        }

        self.answers.insert(
            watcher,
            Answer {
                value,
                submitted_at: SystemTime::now(),
            },
        );
        self.answer_order.push(watcher);

        self.announce_results(roster, tunnel_finder);

        Ok(())
    }

    /// Broadcasts the current aggregate results to all clients
    ///
    /// Does nothing when the room is idle.
    ///
    /// # Arguments
    ///
    /// * `roster` - Connection roster used for broadcasting
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    pub fn announce_results<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        roster: &Roster,
        tunnel_finder: F,
    ) {
        let Some(poll) = &self.current else {
            return;
        };

        roster.announce(
            &UpdateMessage::PollResults {
                question: poll.question.clone(),
                options: poll.options.clone(),
                answers: self.answer_values(),
            }
            .into(),
            tunnel_finder,
        );
    }

    /// Discards any recorded answer of a connection without broadcasting
    ///
    /// Used when a connection leaves or is kicked; the caller decides
    /// whether a results rebroadcast should follow.
    ///
    /// # Arguments
    ///
    /// * `watcher` - The connection whose answer should be discarded
    ///
    /// # Returns
    ///
    /// `true` if an answer was removed, `false` if none was recorded
    pub fn forget_answer(&mut self, watcher: Id) -> bool {
        let removed = self.answers.remove(&watcher).is_some();
        self.answer_order.retain(|other| *other != watcher);
        removed
    }

    /// Force-ends the poll the given alarm was armed for
    ///
    /// Stale alarms (carrying the ID of a poll that was replaced or reset
    /// since the alarm was armed) are ignored, so a stale timer can never
    /// end a newer poll. On expiry the final results are broadcast as
    /// `PollEnded` and the terminal snapshot is returned for the history
    /// log before the room transitions back to idle.
    ///
    /// # Arguments
    ///
    /// * `poll` - The poll ID carried by the fired alarm
    /// * `roster` - Connection roster used for broadcasting
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    ///
    /// # Returns
    ///
    /// The terminal snapshot of the ended poll, or `None` for stale alarms
    pub fn expire<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        poll: PollId,
        roster: &Roster,
        tunnel_finder: F,
    ) -> Option<HistoryEntry> {
        let current = self.current.as_ref()?;
        if current.id != poll {
            return None;
        }

        let final_answers = self.answer_values();

        roster.announce(
            &UpdateMessage::PollEnded {
                question: current.question.clone(),
                options: current.options.clone(),
                final_answers: final_answers.clone(),
            }
            .into(),
            tunnel_finder,
        );

        let entry = HistoryEntry::new(
            current.id,
            current.question.clone(),
            current.options.clone(),
            final_answers,
            false,
        );

        self.clear();

        Some(entry)
    }

    /// Manually resets the poll
    ///
    /// If a poll is active its terminal snapshot is returned for the
    /// history log, marked as manually ended. A `PollReset` broadcast is
    /// sent in every case, making the operation idempotent when the room
    /// is already idle. Resetting consumes the active poll, so any armed
    /// expiry alarm becomes stale.
    ///
    /// # Arguments
    ///
    /// * `roster` - Connection roster used for broadcasting
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    ///
    /// # Returns
    ///
    /// The terminal snapshot of the reset poll, or `None` if idle
    pub fn reset<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        roster: &Roster,
        tunnel_finder: F,
    ) -> Option<HistoryEntry> {
        let entry = self.current.as_ref().map(|poll| {
            HistoryEntry::new(
                poll.id,
                poll.question.clone(),
                poll.options.clone(),
                self.answer_values(),
                true,
            )
        });

        self.clear();

        roster.announce(&UpdateMessage::PollReset.into(), tunnel_finder);

        entry
    }

    /// Returns the catch-up message for a late joiner
    ///
    /// # Returns
    ///
    /// The active question with its remaining time, or `None` when idle
    pub fn sync_message(&self) -> Option<SyncMessage> {
        self.current.as_ref().map(|poll| SyncMessage::Question {
            question: poll.question.clone(),
            options: poll.options.clone(),
            remaining: poll.remaining(),
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::{
        collections::{HashMap, VecDeque},
        sync::{Arc, Mutex},
    };

    use garde::Validate;

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct MockTunnel {
        messages: Arc<Mutex<VecDeque<crate::UpdateMessage>>>,
        states: Arc<Mutex<VecDeque<crate::SyncMessage>>>,
        closed: Arc<Mutex<bool>>,
    }

    impl crate::session::Tunnel for MockTunnel {
        fn send_message(&self, message: &crate::UpdateMessage) {
            self.messages.lock().unwrap().push_back(message.clone());
        }

        fn send_state(&self, message: &crate::SyncMessage) {
            self.states.lock().unwrap().push_back(message.clone());
        }

        fn close(self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct TestRoom {
        roster: Roster,
        tunnels: HashMap<Id, MockTunnel>,
    }

    impl TestRoom {
        fn with_students(names: &[&str]) -> (Self, Vec<Id>) {
            let mut roster = Roster::default();
            let mut tunnels = HashMap::new();
            let mut ids = Vec::new();

            for name in names {
                let id = Id::new();
                roster.register(id, (*name).to_string()).unwrap();
                tunnels.insert(id, MockTunnel::default());
                ids.push(id);
            }

            (Self { roster, tunnels }, ids)
        }

        fn finder(&self) -> impl Fn(Id) -> Option<MockTunnel> + '_ {
            move |id| self.tunnels.get(&id).cloned()
        }

        fn messages_of(&self, id: Id) -> Vec<crate::UpdateMessage> {
            self.tunnels[&id]
                .messages
                .lock()
                .unwrap()
                .iter()
                .cloned()
                .collect()
        }
    }

    fn create_test_config() -> PollConfig {
        PollConfig {
            question: "What is 2 + 2?".to_string(),
            options: vec!["3".to_string(), "4".to_string(), "5".to_string()],
            timer: Duration::from_secs(60),
        }
    }

    fn no_schedule(_message: crate::AlarmMessage, _duration: Duration) {}

    #[test]
    fn test_config_validation() {
        let config = create_test_config();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_question_too_long() {
        let mut config = create_test_config();
        config.question = "a".repeat(crate::constants::poll::MAX_QUESTION_LENGTH + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_too_few_options() {
        let mut config = create_test_config();
        config.options = vec!["only one".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_timer_out_of_bounds() {
        let mut config = create_test_config();
        config.timer = Duration::from_secs(crate::constants::poll::MIN_TIMER - 1);
        assert!(config.validate().is_err());

        config.timer = Duration::from_secs(crate::constants::poll::MAX_TIMER + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default_timer_from_wire() {
        let config: PollConfig =
            serde_json::from_str(r#"{"question":"Q?","options":["A","B"]}"#).unwrap();
        assert_eq!(
            config.timer,
            Duration::from_secs(crate::constants::poll::DEFAULT_TIMER)
        );
    }

    #[test]
    fn test_submit_without_poll_fails_without_mutation() {
        let (room, ids) = TestRoom::with_students(&["Alice"]);
        let mut session = PollSession::default();

        let result = session.submit(ids[0], "A".to_string(), &room.roster, room.finder());

        assert_eq!(result, Err(SubmitError::NoActivePoll));
        assert_eq!(session.answer_count(), 0);
        assert!(room.messages_of(ids[0]).is_empty());
    }

    #[test]
    fn test_create_arms_alarm_and_announces_in_order() {
        let (room, ids) = TestRoom::with_students(&["Alice"]);
        let mut session = PollSession::default();
        let mut scheduled = Vec::new();

        session.create(
            create_test_config(),
            &room.roster,
            |message, duration| scheduled.push((message, duration)),
            room.finder(),
        );

        assert!(session.is_active());
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].1, Duration::from_secs(60));

        let messages = room.messages_of(ids[0]);
        assert!(matches!(
            messages[0],
            crate::UpdateMessage::Poll(UpdateMessage::ClearResults)
        ));
        assert!(matches!(
            &messages[1],
            crate::UpdateMessage::Poll(UpdateMessage::NewQuestion { question, .. })
                if question == "What is 2 + 2?"
        ));
    }

    #[test]
    fn test_create_supersedes_active_poll_and_clears_answers() {
        let (room, ids) = TestRoom::with_students(&["Alice"]);
        let mut session = PollSession::default();

        session.create(create_test_config(), &room.roster, no_schedule, room.finder());
        session
            .submit(ids[0], "4".to_string(), &room.roster, room.finder())
            .unwrap();
        assert_eq!(session.answer_count(), 1);

        let first_id = session.current().unwrap().id();

        session.create(create_test_config(), &room.roster, no_schedule, room.finder());

        assert_eq!(session.answer_count(), 0);
        assert_ne!(session.current().unwrap().id(), first_id);

        // the superseded poll leaves no terminal snapshot behind
        let stale = session.expire(first_id, &room.roster, room.finder());
        assert!(stale.is_none());
        assert!(session.is_active());
    }

    #[test]
    fn test_duplicate_submission_keeps_first_value() {
        let (room, ids) = TestRoom::with_students(&["Alice"]);
        let mut session = PollSession::default();

        session.create(create_test_config(), &room.roster, no_schedule, room.finder());

        session
            .submit(ids[0], "4".to_string(), &room.roster, room.finder())
            .unwrap();
        let second = session.submit(ids[0], "5".to_string(), &room.roster, room.finder());

        assert_eq!(second, Err(SubmitError::DuplicateSubmission));
        assert_eq!(session.answer_count(), 1);
        assert_eq!(session.answer_values(), vec!["4".to_string()]);
    }

    #[test]
    fn test_results_broadcast_reaches_everyone() {
        let (room, ids) = TestRoom::with_students(&["Alice", "Bob"]);
        let mut session = PollSession::default();

        session.create(create_test_config(), &room.roster, no_schedule, room.finder());
        session
            .submit(ids[0], "4".to_string(), &room.roster, room.finder())
            .unwrap();

        for id in &ids {
            let results = room
                .messages_of(*id)
                .into_iter()
                .filter(|message| {
                    matches!(
                        message,
                        crate::UpdateMessage::Poll(UpdateMessage::PollResults { .. })
                    )
                })
                .count();
            assert_eq!(results, 1);
        }
    }

    #[test]
    fn test_expire_returns_snapshot_and_goes_idle() {
        let (room, ids) = TestRoom::with_students(&["Alice", "Bob"]);
        let mut session = PollSession::default();

        session.create(create_test_config(), &room.roster, no_schedule, room.finder());
        let poll_id = session.current().unwrap().id();

        session
            .submit(ids[0], "4".to_string(), &room.roster, room.finder())
            .unwrap();
        session
            .submit(ids[1], "4".to_string(), &room.roster, room.finder())
            .unwrap();

        let entry = session
            .expire(poll_id, &room.roster, room.finder())
            .unwrap();

        assert!(!session.is_active());
        assert_eq!(session.answer_count(), 0);
        assert!(!entry.manually_ended());
        assert_eq!(entry.total_responses(), 2);
        assert_eq!(entry.answers(), &["4".to_string(), "4".to_string()]);

        let ended = room
            .messages_of(ids[0])
            .into_iter()
            .find_map(|message| match message {
                crate::UpdateMessage::Poll(UpdateMessage::PollEnded { final_answers, .. }) => {
                    Some(final_answers)
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(ended, vec!["4".to_string(), "4".to_string()]);
    }

    #[test]
    fn test_stale_alarm_is_ignored() {
        let (room, _ids) = TestRoom::with_students(&["Alice"]);
        let mut session = PollSession::default();

        session.create(create_test_config(), &room.roster, no_schedule, room.finder());
        let first_id = session.current().unwrap().id();

        session.reset(&room.roster, room.finder());
        assert!(session.expire(first_id, &room.roster, room.finder()).is_none());

        // the same applies after the poll is replaced
        session.create(create_test_config(), &room.roster, no_schedule, room.finder());
        assert!(session.expire(first_id, &room.roster, room.finder()).is_none());
        assert!(session.is_active());
    }

    #[test]
    fn test_reset_active_poll_snapshots_as_manually_ended() {
        let (room, ids) = TestRoom::with_students(&["Alice"]);
        let mut session = PollSession::default();

        session.create(create_test_config(), &room.roster, no_schedule, room.finder());
        session
            .submit(ids[0], "4".to_string(), &room.roster, room.finder())
            .unwrap();

        let entry = session.reset(&room.roster, room.finder()).unwrap();

        assert!(entry.manually_ended());
        assert_eq!(entry.total_responses(), 1);
        assert!(!session.is_active());

        let resets = room
            .messages_of(ids[0])
            .into_iter()
            .filter(|message| {
                matches!(message, crate::UpdateMessage::Poll(UpdateMessage::PollReset))
            })
            .count();
        assert_eq!(resets, 1);
    }

    #[test]
    fn test_reset_when_idle_still_broadcasts() {
        let (room, ids) = TestRoom::with_students(&["Alice"]);
        let mut session = PollSession::default();

        let entry = session.reset(&room.roster, room.finder());

        assert!(entry.is_none());
        let messages = room.messages_of(ids[0]);
        assert!(matches!(
            messages[0],
            crate::UpdateMessage::Poll(UpdateMessage::PollReset)
        ));
    }

    #[test]
    fn test_forget_answer() {
        let (room, ids) = TestRoom::with_students(&["Alice", "Bob"]);
        let mut session = PollSession::default();

        session.create(create_test_config(), &room.roster, no_schedule, room.finder());
        session
            .submit(ids[0], "4".to_string(), &room.roster, room.finder())
            .unwrap();
        session
            .submit(ids[1], "3".to_string(), &room.roster, room.finder())
            .unwrap();

        assert!(session.forget_answer(ids[0]));
        assert!(!session.forget_answer(ids[0]));
        assert_eq!(session.answer_values(), vec!["3".to_string()]);
    }

    #[test]
    fn test_sync_message_carries_remaining_time() {
        let (room, _ids) = TestRoom::with_students(&["Alice"]);
        let mut session = PollSession::default();

        assert!(session.sync_message().is_none());

        session.create(create_test_config(), &room.roster, no_schedule, room.finder());

        let Some(SyncMessage::Question { remaining, .. }) = session.sync_message() else {
            panic!("expected an active question sync");
        };
        assert!(remaining <= Duration::from_secs(60));
    }
}
