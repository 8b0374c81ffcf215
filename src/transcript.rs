//! Append-only conversation transcript
//!
//! The log is written only by the session controller. Readers take a
//! [`TranscriptSnapshot`], which shares the underlying buffer until the next
//! append, at which point the writer copies instead of mutating what readers hold.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// The remote voice agent. The service labels it `ai` on the wire.
    #[serde(alias = "ai")]
    Agent,
    /// Lifecycle notices written by the controller
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Agent => write!(f, "agent"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Source of capture timestamps for transcript entries
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique within the log, increasing in insertion order
    pub id: u64,

    pub role: Role,

    /// Text payload, stored verbatim
    pub content: String,

    /// When the entry was captured (not used for ordering)
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Capture time in local display precision, e.g. `14:30:05`
    pub fn display_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

/// Ordered message history owned by one controller
pub struct TranscriptLog {
    entries: Arc<Vec<Message>>,
    next_id: u64,
    clock: Arc<dyn Clock>,
}

impl TranscriptLog {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            next_id: 1,
            clock,
        }
    }

    /// Append an entry and return its id. Never fails.
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let message = Message {
            id,
            role,
            content: content.into(),
            timestamp: self.clock.now(),
        };

        // Clones the buffer only if a snapshot is still holding it
        Arc::make_mut(&mut self.entries).push(message);

        id
    }

    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            entries: Arc::clone(&self.entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for TranscriptLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptLog")
            .field("len", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// Point-in-time view of the transcript
///
/// Iterating never observes entries appended after the snapshot was taken, and
/// can be restarted any number of times.
#[derive(Debug, Clone)]
pub struct TranscriptSnapshot {
    entries: Arc<Vec<Message>>,
}

impl TranscriptSnapshot {
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }
}

impl<'a> IntoIterator for &'a TranscriptSnapshot {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for TranscriptSnapshot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.as_ref().serialize(serializer)
    }
}
