//! Connection and student roster management
//!
//! This module tracks every live connection in the room and which of them
//! has registered as a student with a display name. It provides targeted
//! message delivery to one connection and broadcast delivery to everyone,
//! both driven by a tunnel-finder closure supplied by the embedding server.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;
use uuid::Uuid;
use web_time::SystemTime;

use super::{SyncMessage, UpdateMessage, session::Tunnel};

/// A unique identifier for a live connection
///
/// Each connection gets a unique opaque ID that persists for the lifetime
/// of that transport connection. The ID is never reused while the
/// connection is still registered.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random connection ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for Id {
    /// Creates a new random connection ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Id {
    /// Formats the ID as a UUID string
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    /// Parses an ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// The registration state of a connection in the room
///
/// A connection starts out unassigned (typically the teacher dashboard or
/// a student who has not entered a name yet) and becomes a student once a
/// display name is registered for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// A connection that has not registered a display name
    Unassigned,
    /// A student registered with a display name
    Student {
        /// The student's chosen display name
        name: String,
        /// When the student first registered
        joined_at: SystemTime,
    },
}

/// Wire representation of one student for roster broadcasts
///
/// This is the shape carried by the `StudentsUpdated` broadcast and the
/// targeted roster sync, pairing the display name with the connection ID
/// so a teacher view can address individual students (e.g. for kicking).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentEntry {
    /// The student's display name
    pub name: String,
    /// The connection ID the student is registered under
    pub socket_id: Id,
    /// When the student first registered
    pub joined_at: SystemTime,
}

/// Errors that can occur when managing the roster
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The room has reached the maximum number of allowed students
    #[error("maximum number of students reached")]
    MaximumStudents,
}

/// Tracks all live connections and registered students in a room
///
/// The roster owns the mapping from connection ID to registration state
/// and remembers registration order so student listings are reproducible.
#[derive(Debug, Default)]
pub struct Roster {
    /// Mapping from connection ID to its registration state
    mapping: HashMap<Id, Value>,
    /// Connection IDs in first-registration order
    join_order: Vec<Id>,
}

impl Roster {
    /// Adds a live connection in the unassigned state
    ///
    /// Called when a transport connection is established. Does nothing if
    /// the connection is already known, preserving any registration.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the newly established connection
    pub fn add_connection(&mut self, id: Id) {
        self.mapping.entry(id).or_insert(Value::Unassigned);
    }

    /// Registers a display name for a connection
    ///
    /// Upserts the student record for `id`: re-registering the same
    /// connection overwrites its name but keeps the original join time.
    /// Display names are not required to be unique across connections.
    ///
    /// # Arguments
    ///
    /// * `id` - The connection to register
    /// * `name` - The display name chosen by the student
    ///
    /// # Errors
    ///
    /// Returns [`Error::MaximumStudents`] if this registration would exceed
    /// the maximum allowed number of students in the room.
    pub fn register(&mut self, id: Id, name: String) -> Result<(), Error> {
        match self.mapping.get_mut(&id) {
            Some(Value::Student {
                name: existing_name,
                ..
            }) => {
                *existing_name = name;
            }
            _ => {
                if self.student_count() >= crate::constants::roster::MAX_STUDENT_COUNT {
                    return Err(Error::MaximumStudents);
                }
                self.mapping.insert(
                    id,
                    Value::Student {
                        name,
                        joined_at: SystemTime::now(),
                    },
                );
                self.join_order.push(id);
            }
        }

        Ok(())
    }

    /// Removes a connection and any student record it holds
    ///
    /// This is a no-op when the connection is not known, mirroring the
    /// best-effort semantics of removing something that may have already
    /// left.
    ///
    /// # Arguments
    ///
    /// * `id` - The connection to remove
    pub fn remove(&mut self, id: Id) {
        self.mapping.remove(&id);
        self.join_order.retain(|other| *other != id);
    }

    /// Checks whether a connection is known to the roster
    pub fn contains(&self, id: Id) -> bool {
        self.mapping.contains_key(&id)
    }

    /// Gets the display name registered for a connection
    ///
    /// # Returns
    ///
    /// The student's name if the connection is registered, otherwise `None`
    pub fn get_name(&self, id: Id) -> Option<String> {
        match self.mapping.get(&id) {
            Some(Value::Student { name, .. }) => Some(name.clone()),
            _ => None,
        }
    }

    /// Returns the number of registered students
    pub fn student_count(&self) -> usize {
        self.join_order.len()
    }

    /// Lists all registered students in registration order
    ///
    /// # Returns
    ///
    /// A snapshot of [`StudentEntry`] records, oldest registration first
    pub fn students(&self) -> Vec<StudentEntry> {
        self.join_order
            .iter()
            .filter_map(|id| match self.mapping.get(id) {
                Some(Value::Student { name, joined_at }) => Some(StudentEntry {
                    name: name.clone(),
                    socket_id: *id,
                    joined_at: *joined_at,
                }),
                _ => None,
            })
            .collect_vec()
    }

    /// Checks if a connection has an active transport tunnel
    ///
    /// # Arguments
    ///
    /// * `id` - The connection to check
    /// * `tunnel_finder` - Function to retrieve the tunnel for the connection
    pub fn is_alive<T: Tunnel, F: Fn(Id) -> Option<T>>(id: Id, tunnel_finder: F) -> bool {
        tunnel_finder(id).is_some()
    }

    /// Closes the transport tunnel of a connection
    ///
    /// Used to force-disconnect a kicked student after the kick
    /// notification has been delivered.
    ///
    /// # Arguments
    ///
    /// * `id` - The connection whose tunnel should be closed
    /// * `tunnel_finder` - Function to retrieve the tunnel for the connection
    pub fn remove_session<T: Tunnel, F: Fn(Id) -> Option<T>>(&self, id: Id, tunnel_finder: F) {
        if let Some(tunnel) = tunnel_finder(id) {
            tunnel.close();
        }
    }

    /// Sends an update message to a specific connection
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    /// * `id` - The connection to send to
    /// * `tunnel_finder` - Function to retrieve the tunnel for the connection
    pub fn send_message<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        id: Id,
        tunnel_finder: F,
    ) {
        let Some(tunnel) = tunnel_finder(id) else {
            return;
        };

        tunnel.send_message(message);
    }

    /// Sends a state synchronization message to a specific connection
    ///
    /// # Arguments
    ///
    /// * `message` - The sync message to send
    /// * `id` - The connection to send to
    /// * `tunnel_finder` - Function to retrieve the tunnel for the connection
    pub fn send_state<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &SyncMessage,
        id: Id,
        tunnel_finder: F,
    ) {
        let Some(tunnel) = tunnel_finder(id) else {
            return;
        };

        tunnel.send_state(message);
    }

    /// Broadcasts an update message to every connection with a live tunnel
    ///
    /// Unassigned connections are included: result and roster broadcasts
    /// must reach teacher views that never register a name.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to broadcast
    /// * `tunnel_finder` - Function to retrieve tunnels for connections
    pub fn announce<T: Tunnel, F: Fn(Id) -> Option<T>>(
        &self,
        message: &UpdateMessage,
        tunnel_finder: F,
    ) {
        for id in self.mapping.keys() {
            if let Some(tunnel) = tunnel_finder(*id) {
                tunnel.send_message(message);
            }
        }
    }
}
