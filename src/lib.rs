//! # Livepoll Library
//!
//! This library provides the core session logic for a real-time classroom
//! polling system. It handles the shared poll state machine, the student
//! roster, chat, poll history, and real-time fan-out of state changes to
//! every connected client.
//!
//! The library is transport-agnostic: the embedding server hands it one
//! [`session::Tunnel`] per live connection and a scheduling callback for
//! timer-driven poll expiry, then feeds every inbound client event and
//! fired alarm into a single [`room::Room`].

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use serde::{Deserialize, Serialize};

pub mod chat;
pub mod constants;
pub mod history;
pub mod poll;
pub mod room;
pub mod roster;
pub mod session;

/// Messages broadcast or targeted to clients when the room state changes
///
/// This enum represents all possible update messages that can be sent to
/// keep client views consistent with the shared room state.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Room-level updates (roster changes, kick notifications)
    Room(room::UpdateMessage),
    /// Poll lifecycle and result updates
    Poll(poll::UpdateMessage),
    /// Chat message updates
    Chat(chat::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages sent to synchronize a single client with the current state
///
/// Sync messages are targeted deliveries: late-joiner catch-up with the
/// active poll, and replay of the roster, chat log, or poll history on
/// request.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Room-level synchronization (roster, past polls)
    Room(room::SyncMessage),
    /// Active poll catch-up for late joiners
    Poll(poll::SyncMessage),
    /// Chat history replay
    Chat(chat::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Alarm messages for timed events
///
/// These messages are scheduled through the embedding server's timer
/// facility and fed back into the room when they fire, driving the
/// timeout transition of the active poll.
#[derive(Debug, Clone, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Poll expiry alarms
    Poll(poll::AlarmMessage),
}
