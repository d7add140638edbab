//! Configuration constants for the live polling system
//!
//! This module contains all the configuration limits and constraints
//! used throughout the polling session to ensure data integrity and
//! provide consistent boundaries for different components.

/// Poll configuration constants
pub mod poll {
    /// Minimum length of a poll question
    pub const MIN_QUESTION_LENGTH: usize = 1;
    /// Maximum length of a poll question in characters
    pub const MAX_QUESTION_LENGTH: usize = 200;
    /// Minimum number of answer options for a poll
    pub const MIN_OPTION_COUNT: usize = 2;
    /// Maximum number of answer options for a poll
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of a single answer option in characters
    pub const MAX_OPTION_LENGTH: usize = 200;
    /// Minimum timer duration in seconds for a poll
    pub const MIN_TIMER: u64 = 5;
    /// Maximum timer duration in seconds for a poll
    pub const MAX_TIMER: u64 = 3600;
    /// Timer duration in seconds used when a poll does not specify one
    pub const DEFAULT_TIMER: u64 = 60;
}

/// Connection roster configuration constants
pub mod roster {
    /// Maximum number of students allowed in a single room
    pub const MAX_STUDENT_COUNT: usize = 1000;
    /// Maximum length of a student display name in characters
    pub const MAX_NAME_LENGTH: usize = 100;
}

/// Poll history configuration constants
pub mod history {
    /// Number of ended polls retained, oldest evicted first
    pub const CAPACITY: usize = 50;
}

/// Chat configuration constants
pub mod chat {
    /// Maximum length of a chat message in characters
    pub const MAX_MESSAGE_LENGTH: usize = 1000;
}
