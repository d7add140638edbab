//! Room coordination and event routing
//!
//! This module owns the shared state of one polling session: the
//! connection roster, the poll state machine, the chat log, and the poll
//! history. Every inbound client event and every fired timer alarm is fed
//! into the [`Room`], which mutates exactly one of those components and
//! fans the resulting view out to the affected audience.
//!
//! The room has no global state: the embedding server owns one `Room` and
//! serializes all calls into it, so every invariant holds between events
//! without any locking inside the library.

use std::time;

use garde::Validate;
use serde::Deserialize;

use crate::{
    AlarmMessage,
    chat::{ChatLog, ChatMessage, SenderType},
    history::{HistoryEntry, HistoryLog},
    poll::{self, PollConfig, PollSession},
    roster::{Id, Roster, StudentEntry},
    session::Tunnel,
};

/// Inbound events from clients
///
/// This is the closed set of payloads a client can send; the compiler
/// enforces the payload shape of every event. Connection establishment
/// and disconnect are not messages: they originate from the transport and
/// enter the room through [`Room::add_connection`] and
/// [`Room::remove_connection`].
#[derive(Debug, Deserialize, Clone, Validate)]
pub enum IncomingMessage {
    /// Registers (or renames) the sending connection as a student
    RegisterStudent {
        /// The display name to register
        #[garde(length(min = 1, max = crate::constants::roster::MAX_NAME_LENGTH))]
        name: String,
    },
    /// Removes a student connection from the room
    KickStudent {
        /// The connection to kick
        #[garde(skip)]
        target: Id,
    },
    /// Requests the current student list (targeted reply)
    RequestStudentList,
    /// Appends a chat message and broadcasts it
    SendChatMessage {
        /// Display name of the sender
        #[garde(length(min = 1, max = crate::constants::roster::MAX_NAME_LENGTH))]
        sender: String,
        /// Whether the sender is the teacher or a student
        #[garde(skip)]
        sender_type: SenderType,
        /// The message text
        #[garde(length(min = 1, max = crate::constants::chat::MAX_MESSAGE_LENGTH))]
        message: String,
    },
    /// Requests the full chat history (targeted reply)
    RequestChatHistory,
    /// Requests the history of ended polls (targeted reply)
    RequestPastPolls,
    /// Creates a new poll, discarding any active one
    CreateQuestion(#[garde(dive)] PollConfig),
    /// Manually ends the active poll (idempotent when idle)
    ResetPoll,
    /// Submits the sending connection's answer to the active poll
    SubmitAnswer {
        /// The chosen answer value
        #[garde(length(max = crate::constants::poll::MAX_OPTION_LENGTH))]
        answer: String,
    },
}

/// Room-level update messages
#[derive(Debug, serde::Serialize, Clone)]
pub enum UpdateMessage {
    /// The current student roster, broadcast after every roster change
    StudentsUpdated(Vec<StudentEntry>),
    /// (TARGETED) Tells a kicked connection it was removed from the room
    KickedOut,
}

/// Room-level sync messages for targeted replay
#[derive(Debug, serde::Serialize, Clone)]
pub enum SyncMessage {
    /// The current student roster, sent on request
    Students(Vec<StudentEntry>),
    /// The history of ended polls, newest first, sent on request
    PastPolls(Vec<HistoryEntry>),
}

/// The shared state of one live polling session
///
/// All mutation goes through [`Room::receive_message`],
/// [`Room::receive_alarm`], [`Room::add_connection`], and
/// [`Room::remove_connection`]; each call runs to completion before the
/// next, so the answer-uniqueness, idle-implies-empty, and history-bound
/// invariants hold at every observation point between events.
#[derive(Debug, Default)]
pub struct Room {
    /// All live connections and registered students
    roster: Roster,
    /// The poll state machine
    session: PollSession,
    /// The append-only chat log
    chat: ChatLog,
    /// Terminal snapshots of ended polls
    history: HistoryLog,
}

impl Room {
    /// Returns the connection roster
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Returns the poll state machine
    pub fn session(&self) -> &PollSession {
        &self.session
    }

    /// Returns the chat log
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Returns the history of ended polls
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Broadcasts the current student roster to every connection
    fn announce_students<T: Tunnel, F: Fn(Id) -> Option<T>>(&self, tunnel_finder: F) {
        self.roster.announce(
            &UpdateMessage::StudentsUpdated(self.roster.students()).into(),
            tunnel_finder,
        );
    }

    /// Registers a newly established transport connection
    ///
    /// If a poll is active, the new connection is caught up with the
    /// current question and its remaining time as a single targeted
    /// message; nothing is broadcast.
    ///
    /// # Arguments
    ///
    /// * `watcher` - The ID of the new connection
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    pub fn add_connection<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        watcher: Id,
        tunnel_finder: F,
    ) {
        self.roster.add_connection(watcher);

        if let Some(sync) = self.session.sync_message() {
            self.roster.send_state(&sync.into(), watcher, tunnel_finder);
        }
    }

    /// Handles a transport-level disconnect
    ///
    /// Disconnect is a first-class transition: the connection's answer is
    /// discarded, the roster shrinks and is rebroadcast, and if a poll is
    /// active the aggregate results are re-sent to reflect the reduced
    /// answer set.
    ///
    /// # Arguments
    ///
    /// * `watcher` - The ID of the disconnected connection
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    pub fn remove_connection<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        watcher: Id,
        tunnel_finder: F,
    ) {
        self.session.forget_answer(watcher);
        self.roster.remove(watcher);

        self.announce_students(&tunnel_finder);

        if self.session.is_active() {
            self.session.announce_results(&self.roster, tunnel_finder);
        }
    }

    /// Handles an inbound client event
    ///
    /// Each event mutates exactly one component and then pushes the
    /// resulting view to its audience: roster changes and poll/chat
    /// activity broadcast to everyone, history/chat/roster requests and
    /// rejected submissions answer only the originating connection.
    ///
    /// # Arguments
    ///
    /// * `watcher` - The connection that sent the event
    /// * `message` - The event to process
    /// * `schedule_message` - Function to schedule poll expiry alarms
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    pub fn receive_message<
        T: Tunnel,
        F: Fn(Id) -> Option<T>,
        S: FnMut(AlarmMessage, time::Duration),
    >(
        &mut self,
        watcher: Id,
        message: IncomingMessage,
        schedule_message: S,
        tunnel_finder: F,
    ) {
        match message {
            IncomingMessage::RegisterStudent { name } => {
                if self.roster.register(watcher, name).is_ok() {
                    self.announce_students(tunnel_finder);
                }
            }
            IncomingMessage::KickStudent { target } => {
                self.kick(target, tunnel_finder);
            }
            IncomingMessage::RequestStudentList => {
                self.roster.send_state(
                    &SyncMessage::Students(self.roster.students()).into(),
                    watcher,
                    tunnel_finder,
                );
            }
            IncomingMessage::SendChatMessage {
                sender,
                sender_type,
                message,
            } => {
                let stored: ChatMessage = self.chat.append(sender, sender_type, message);
                self.roster.announce(
                    &crate::chat::UpdateMessage::MessageReceived(stored).into(),
                    tunnel_finder,
                );
            }
            IncomingMessage::RequestChatHistory => {
                self.roster.send_state(
                    &crate::chat::SyncMessage::History(self.chat.snapshot()).into(),
                    watcher,
                    tunnel_finder,
                );
            }
            IncomingMessage::RequestPastPolls => {
                self.roster.send_state(
                    &SyncMessage::PastPolls(self.history.snapshot()).into(),
                    watcher,
                    tunnel_finder,
                );
            }
            IncomingMessage::CreateQuestion(config) => {
                self.session
                    .create(config, &self.roster, schedule_message, tunnel_finder);
            }
            IncomingMessage::ResetPoll => {
                if let Some(entry) = self.session.reset(&self.roster, tunnel_finder) {
                    self.history.append(entry);
                }
            }
            IncomingMessage::SubmitAnswer { answer } => {
                if let Err(error) =
                    self.session
                        .submit(watcher, answer, &self.roster, &tunnel_finder)
                {
                    self.roster.send_message(
                        &poll::UpdateMessage::SubmissionError {
                            message: error.to_string(),
                        }
                        .into(),
                        watcher,
                        tunnel_finder,
                    );
                }
            }
        }
    }

    /// Removes a student connection from the room
    ///
    /// Best-effort: a target without a live tunnel (already left) is a
    /// silent no-op, not an error. A live target has any pending answer
    /// discarded, is told it was kicked, has its tunnel force-closed, and
    /// the shrunken roster is broadcast.
    fn kick<T: Tunnel, F: Fn(Id) -> Option<T>>(&mut self, target: Id, tunnel_finder: F) {
        if !Roster::is_alive(target, &tunnel_finder) {
            return;
        }

        self.session.forget_answer(target);
        self.roster.remove(target);

        self.roster
            .send_message(&UpdateMessage::KickedOut.into(), target, &tunnel_finder);
        self.roster.remove_session(target, &tunnel_finder);

        self.announce_students(tunnel_finder);
    }

    /// Handles a fired timer alarm
    ///
    /// Poll expiry alarms force-end the poll they were armed for; the
    /// generation guard inside the poll session makes alarms armed for
    /// replaced or reset polls harmless.
    ///
    /// # Arguments
    ///
    /// * `message` - The fired alarm
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    pub fn receive_alarm<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &mut self,
        message: AlarmMessage,
        tunnel_finder: F,
    ) {
        match message {
            AlarmMessage::Poll(poll::AlarmMessage::Expire { poll }) => {
                if let Some(entry) = self.session.expire(poll, &self.roster, tunnel_finder) {
                    self.history.append(entry);
                }
            }
        }
    }
}
