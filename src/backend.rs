//! Collaborator contracts consumed by the scheduler
//!
//! The scheduler drives playback but performs no I/O of its own: resolving
//! a track into something playable, pushing audio to a voice connection,
//! announcing tracks, and tearing a session down are all behind these
//! traits. Implementations live with the bot front end; tests use fakes.

use crate::error::Result;
use crate::types::{AudioResource, Playable, SessionId};
use async_trait::async_trait;
use tokio::sync::oneshot;

/// Turns a queued [`Playable`] into an audio-producing resource
///
/// May be arbitrarily slow (network fetch); the scheduler awaits it without
/// a deadline once an entry has been dequeued.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a track, failing with [`crate::PlaybackError::Resolution`]
    async fn resolve(&self, entry: &Playable) -> Result<AudioResource>;
}

/// Opaque audio output owned by one scheduler
///
/// `play` must consume `on_finished` exactly once per successful call:
/// either on natural end of track or when `stop` interrupts it. `stop`,
/// `pause` and `resume` are no-ops when nothing applicable is happening.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start playing a resource; `on_finished` fires when it ends
    async fn play(&self, resource: AudioResource, on_finished: oneshot::Sender<()>) -> Result<()>;

    /// Pause output, keeping the current track loaded
    async fn pause(&self);

    /// Resume paused output
    async fn resume(&self);

    /// Force-stop the current track, firing its completion signal
    async fn stop(&self);

    /// Whether a track is actively outputting
    async fn is_playing(&self) -> bool;

    /// Whether a track is loaded but paused
    async fn is_paused(&self) -> bool;
}

/// Best-effort notification channel (e.g. a text channel embed)
///
/// Failures are logged by the scheduler and never affect playback.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce that a track started playing
    async fn announce(&self, entry: &Playable) -> Result<()>;

    /// Report a track that could not be played and was skipped
    async fn playback_error(&self, entry: &Playable, error: &crate::PlaybackError);
}

/// Owner of the session surrounding a scheduler
///
/// The scheduler never tears down its transport directly; it asks the host,
/// which owns the session registry and the voice connection.
#[async_trait]
pub trait LifecycleHost: Send + Sync {
    /// The queue stayed empty past the configured wait; the session should
    /// be reclaimed. Called at most once per scheduler.
    async fn on_idle_timeout(&self, session: SessionId);

    /// The scheduler was stopped explicitly and can be discarded
    async fn on_destroy(&self, session: SessionId);
}
