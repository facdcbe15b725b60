//! Playback scheduler - one consumer loop per session
//!
//! Owns the playlist and the audio transport for a single guild session.
//! A single background task pulls upcoming tracks, resolves them, plays
//! them, and records them into history; every command-facing operation
//! mutates the same shared playlist and is safe to call while the loop
//! runs. An empty queue past the configured wait tears the session down.

use crate::backend::{LifecycleHost, Notifier, Resolver, Transport};
use crate::error::{PlaybackError, Result};
use crate::playlist::SharedPlaylist;
use crate::types::{Enqueueable, Playable, RequesterId, SchedulerConfig, SchedulerState, SessionId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Drives playback for one session
///
/// Created per guild via [`PlaybackScheduler::spawn`], which starts the
/// consumer task immediately. The scheduler is the only owner of its
/// transport: commands may force-stop it (skip and friends) but only the
/// consumer loop starts playback.
pub struct PlaybackScheduler {
    session: SessionId,
    config: SchedulerConfig,
    playlist: SharedPlaylist,

    /// The entry currently held by the transport, if any
    current: Mutex<Option<Playable>>,

    /// Lifecycle state, visible to the front end
    state: Mutex<SchedulerState>,

    /// Whether track starts are announced through the notifier
    announce: AtomicBool,

    resolver: Arc<dyn Resolver>,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    host: Arc<dyn LifecycleHost>,

    /// Handle of the running consumer task
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackScheduler {
    /// Create a scheduler and start its consumer task
    pub async fn spawn(
        session: SessionId,
        config: SchedulerConfig,
        resolver: Arc<dyn Resolver>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        host: Arc<dyn LifecycleHost>,
    ) -> Arc<Self> {
        let announce = config.announce_on_start;
        let scheduler = Arc::new(Self {
            session,
            config,
            playlist: SharedPlaylist::new(),
            current: Mutex::new(None),
            state: Mutex::new(SchedulerState::Idle),
            announce: AtomicBool::new(announce),
            resolver,
            transport,
            notifier,
            host,
            consumer: Mutex::new(None),
        });
        scheduler.start().await;
        info!(session = %scheduler.session, "playback scheduler started");
        scheduler
    }

    /// Spawn (or respawn) the consumer task
    async fn start(self: &Arc<Self>) {
        let task = tokio::spawn(Arc::clone(self).consumer_loop());
        *self.consumer.lock().await = Some(task);
    }

    /// Session this scheduler belongs to
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SchedulerState {
        *self.state.lock().await
    }

    async fn set_state(&self, state: SchedulerState) {
        *self.state.lock().await = state;
    }

    // ===== Consumer loop =====

    async fn consumer_loop(self: Arc<Self>) {
        loop {
            self.set_state(SchedulerState::Running).await;

            // Bounded wait on an empty queue; elapsing is the designed
            // resource-reclamation path, not an error.
            let entry = match timeout(self.config.queue_wait, self.playlist.pop_next()).await {
                Ok(entry) => entry,
                Err(_) => {
                    info!(
                        session = %self.session,
                        wait = ?self.config.queue_wait,
                        "queue stayed empty, requesting session teardown"
                    );
                    self.set_state(SchedulerState::Destroyed).await;
                    self.host.on_idle_timeout(self.session).await;
                    return;
                }
            };

            debug!(session = %self.session, title = %entry.title, "dequeued track");

            let resource = match self.resolver.resolve(&entry).await {
                Ok(resource) => resource,
                Err(err) => {
                    // Skip the failed entry and keep consuming; a stalled
                    // loop would silently end playback for the session.
                    warn!(
                        session = %self.session,
                        title = %entry.title,
                        error = %err,
                        "resolution failed, skipping entry"
                    );
                    self.notifier.playback_error(&entry, &err).await;
                    continue;
                }
            };

            let (done_tx, done_rx) = oneshot::channel();
            if let Err(err) = self.transport.play(resource, done_tx).await {
                warn!(
                    session = %self.session,
                    title = %entry.title,
                    error = %err,
                    "transport failed to start, skipping entry"
                );
                self.notifier.playback_error(&entry, &err).await;
                continue;
            }

            *self.current.lock().await = Some(entry.clone());
            // Commit before any further await, so previous() or a restart
            // issued mid-track already sees the playing entry at the
            // history tail.
            self.playlist.with(|p| p.commit_played(entry.clone())).await;
            self.set_state(SchedulerState::Playing).await;
            info!(session = %self.session, title = %entry.title, "playback started");

            if self.announce.load(Ordering::Relaxed) {
                if let Err(err) = self.notifier.announce(&entry).await {
                    warn!(session = %self.session, error = %err, "announce failed");
                }
            }

            // Resolves on natural end of track or a forced stop; a dropped
            // sender counts as completion too.
            let _ = done_rx.await;
            self.transport.stop().await;
            *self.current.lock().await = None;
        }
    }

    // ===== Queueing =====

    /// Enqueue a track or batch; `to_front` makes it play next
    pub async fn enqueue(&self, entry: Enqueueable, to_front: bool) {
        debug!(session = %self.session, count = entry.len(), to_front, "enqueue");
        self.playlist.push_entry(entry, to_front).await;
    }

    /// The entry held by the transport right now, if any
    pub async fn now_playing(&self) -> Option<Playable> {
        self.current.lock().await.clone()
    }

    /// Whether a track is currently loaded
    pub async fn is_active(&self) -> bool {
        self.current.lock().await.is_some()
    }

    /// Snapshot of the full logical playlist, history first
    pub async fn queue_snapshot(&self) -> Vec<Playable> {
        self.playlist.with(|p| p.entries()).await
    }

    /// Snapshot of the not-yet-played tracks only
    pub async fn upcoming_snapshot(&self) -> Vec<Playable> {
        self.playlist.with(|p| p.upcoming_entries()).await
    }

    // ===== Playback control =====

    /// Force-stop the current track so the loop advances; no-op when idle
    pub async fn skip(&self) {
        if self.current.lock().await.is_some() {
            debug!(session = %self.session, "skip");
            self.transport.stop().await;
        }
    }

    /// Relocate the boundary so the track at `index` plays next, then skip
    ///
    /// Skipping to the position already playing is a no-op and does not
    /// interrupt the transport.
    pub async fn skip_to(&self, index: usize) -> Result<()> {
        let moved = self
            .playlist
            .with(|p| {
                let len = p.len();
                if index == 0 || index > len {
                    return Err(PlaybackError::IndexOutOfRange { index, len });
                }
                if index == p.now_playing_index() {
                    return Ok(false);
                }
                p.shift_to(index - 1)?;
                Ok(true)
            })
            .await?;

        if moved {
            self.skip().await;
        }
        Ok(())
    }

    /// Replay the previously played track
    ///
    /// Re-pushes the prior and current tracks to the front of upcoming (in
    /// that order) and skips, so the prior one plays again followed by the
    /// current one.
    pub async fn previous(&self) -> Result<()> {
        self.playlist
            .with(|p| {
                if p.history_len() < 2 {
                    return Err(PlaybackError::IllegalState(
                        "need at least two played tracks to go back".to_string(),
                    ));
                }
                let (prior, current) = p.pop_last_two()?;
                p.push_entry(vec![prior, current].into(), true);
                Ok(())
            })
            .await?;

        self.skip().await;
        Ok(())
    }

    /// Pause the transport if it is playing
    pub async fn pause(&self) {
        if self.transport.is_playing().await {
            self.transport.pause().await;
        }
    }

    /// Resume the transport if it is paused
    pub async fn resume(&self) {
        if self.transport.is_paused().await {
            self.transport.resume().await;
        }
    }

    // ===== Playlist mutation =====

    /// Move the track at logical `old` to logical `new`
    pub async fn move_song(&self, old: usize, new: usize) -> Result<()> {
        self.playlist.with(|p| p.move_song(old, new)).await
    }

    /// Remove the track at a 1-based logical index
    pub async fn remove_song(&self, index: usize) -> Result<Playable> {
        self.playlist.with(|p| p.remove_at(index)).await
    }

    /// Remove every track requested by one of `ids`; returns count removed
    pub async fn remove_by_requesters(&self, ids: &[RequesterId]) -> usize {
        self.playlist.with(|p| p.remove_requesters(ids)).await
    }

    /// Drop duplicate urls, keeping first occurrences; returns count removed
    pub async fn remove_duplicates(&self) -> usize {
        self.playlist.with(|p| p.remove_duplicates()).await
    }

    /// Drop upcoming tracks whose requester is no longer present; returns
    /// count removed
    pub async fn remove_absent(&self, present: &[RequesterId]) -> usize {
        self.playlist.with(|p| p.remove_absent(present)).await
    }

    /// Shuffle the upcoming queue
    pub async fn shuffle_upcoming(&self) {
        self.playlist.with(|p| p.shuffle_upcoming()).await;
    }

    /// Remove every track, played and upcoming
    pub async fn clear(&self) {
        self.playlist.with(|p| p.clear()).await;
    }

    // ===== Announce toggle =====

    /// Enable or disable track-start announcements
    pub fn set_announce(&self, enabled: bool) {
        self.announce.store(enabled, Ordering::Relaxed);
    }

    /// Whether track-start announcements are enabled
    pub fn announce_enabled(&self) -> bool {
        self.announce.load(Ordering::Relaxed)
    }

    // ===== Lifecycle =====

    /// Tear the consumer down and bring it back up
    ///
    /// Recovers the in-flight track (already committed to history) onto the
    /// front of upcoming so it plays again once the new consumer starts.
    /// Used to unwedge a stuck transport session.
    pub async fn restart(self: &Arc<Self>) {
        info!(session = %self.session, "restarting consumer");

        if let Some(task) = self.consumer.lock().await.take() {
            task.abort();
        }
        self.transport.stop().await;

        // Requeue the in-flight entry itself. Its history record is only
        // dropped when the commit had already landed; an abort between play
        // acceptance and commit must not pop the prior track instead.
        if let Some(current) = self.current.lock().await.take() {
            self.playlist
                .with(|p| {
                    if p.now_playing().map_or(false, |t| t.url == current.url) {
                        let _ = p.pop_last();
                    }
                    p.push_entry(current.into(), true);
                })
                .await;
        }

        tokio::time::sleep(self.config.restart_pause).await;
        self.set_state(SchedulerState::Idle).await;
        self.start().await;
    }

    /// Stop playback, drop the playlist, and request session teardown
    ///
    /// The scheduler ends up `Idle` and should be discarded; a new session
    /// needs a new scheduler.
    pub async fn stop(&self) {
        info!(session = %self.session, "stopping scheduler");

        if let Some(task) = self.consumer.lock().await.take() {
            task.abort();
        }
        self.playlist.with(|p| p.clear()).await;
        self.transport.stop().await;
        *self.current.lock().await = None;

        // Destroyed is terminal: an idle-timed-out scheduler keeps that
        // state and its teardown has already been requested.
        {
            let mut state = self.state.lock().await;
            if *state == SchedulerState::Destroyed {
                return;
            }
            *state = SchedulerState::Idle;
        }
        self.host.on_destroy(self.session).await;
    }
}
