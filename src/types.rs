//! Core types for queueing and scheduling

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque id of the user who requested a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterId(pub u64);

/// Opaque id of one playback session (one guild = one session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One resolved track, ready to be queued
///
/// Produced by the external resolver, never mutated afterwards. Ownership
/// moves between the upcoming and history queues as playback progresses.
/// Two playables with the same `url` are duplicates for dedupe purposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playable {
    /// Track title for display
    pub title: String,

    /// Canonical track URL (identity for dedupe)
    pub url: String,

    /// Who asked for it
    pub requester: RequesterId,

    /// Track duration as reported by the resolver
    pub duration: Duration,
}

/// Audio-producing resource handed to the transport
///
/// Opaque to the scheduler: the resolver fills it in, the transport
/// consumes it.
#[derive(Debug, Clone)]
pub struct AudioResource {
    /// Direct stream URL the transport can open
    pub stream_url: String,

    /// Optional codec hint for the transport
    pub codec: Option<String>,
}

/// One enqueue request: a single track or an ordered batch (e.g. a playlist)
#[derive(Debug, Clone)]
pub enum Enqueueable {
    /// A single resolved track
    Single(Playable),

    /// An ordered batch of tracks; batch order is preserved on insertion
    Batch(Vec<Playable>),
}

impl Enqueueable {
    /// Number of tracks in this request
    pub fn len(&self) -> usize {
        match self {
            Enqueueable::Single(_) => 1,
            Enqueueable::Batch(items) => items.len(),
        }
    }

    /// Whether the request carries no tracks (empty batch)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Playable> for Enqueueable {
    fn from(item: Playable) -> Self {
        Enqueueable::Single(item)
    }
}

impl From<Vec<Playable>> for Enqueueable {
    fn from(items: Vec<Playable>) -> Self {
        Enqueueable::Batch(items)
    }
}

/// Lifecycle state of a scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulerState {
    /// No consumer task running
    Idle,

    /// Consumer task waiting for the next entry
    Running,

    /// Transport is actively outputting a track
    Playing,

    /// Torn down after idle timeout; terminal
    Destroyed,
}

/// Configuration for a playback scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How long the consumer waits on an empty queue before tearing the
    /// session down (default: 180 s)
    pub queue_wait: Duration,

    /// Whether a notification is emitted when a track starts (default: off)
    pub announce_on_start: bool,

    /// Pause between cancelling and respawning the consumer on restart
    /// (default: 500 ms)
    pub restart_pause: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue_wait: Duration::from_secs(180),
            announce_on_start: false,
            restart_pause: Duration::from_millis(500),
        }
    }
}
