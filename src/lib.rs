//! Per-guild music playback scheduling
//!
//! This crate manages the ordering, selection and lifecycle of "what plays
//! next" for a chat-bot music player. It owns no I/O: track resolution,
//! the voice transport, notifications and session teardown are all behind
//! traits implemented by the bot front end.
//!
//! # Architecture
//!
//! - [`OrderedQueue`] - random-access track sequence with stable order
//! - [`Playlist`] - two queues (played history + upcoming) exposed as one
//!   logical, 1-indexed playlist; the boundary between them is the "now
//!   playing" position
//! - [`PlaybackScheduler`] - one consumer task per session that pulls
//!   upcoming tracks, resolves them, drives the transport, and records
//!   history; plus the skip/move/remove operations that stay consistent
//!   with the running loop
//! - [`SessionRegistry`] - explicit session-id to scheduler map
//!
//! # Example
//!
//! ```rust,no_run
//! use guild_playback::{
//!     Enqueueable, Playable, PlaybackScheduler, RequesterId, SchedulerConfig, SessionId,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example(
//! #     resolver: Arc<dyn guild_playback::Resolver>,
//! #     transport: Arc<dyn guild_playback::Transport>,
//! #     notifier: Arc<dyn guild_playback::Notifier>,
//! #     host: Arc<dyn guild_playback::LifecycleHost>,
//! # ) {
//! let scheduler = PlaybackScheduler::spawn(
//!     SessionId(1),
//!     SchedulerConfig::default(),
//!     resolver,
//!     transport,
//!     notifier,
//!     host,
//! )
//! .await;
//!
//! let track = Playable {
//!     title: "My Song".to_string(),
//!     url: "https://example.com/my-song".to_string(),
//!     requester: RequesterId(42),
//!     duration: Duration::from_secs(180),
//! };
//! scheduler.enqueue(Enqueueable::Single(track), false).await;
//! # }
//! ```

mod backend;
mod error;
mod playlist;
mod queue;
mod registry;
mod scheduler;
pub mod types;

// Public exports
pub use backend::{LifecycleHost, Notifier, Resolver, Transport};
pub use error::{PlaybackError, Result};
pub use playlist::{Playlist, SharedPlaylist};
pub use queue::OrderedQueue;
pub use registry::SessionRegistry;
pub use scheduler::PlaybackScheduler;
pub use types::{
    AudioResource, Enqueueable, Playable, RequesterId, SchedulerConfig, SchedulerState, SessionId,
};
