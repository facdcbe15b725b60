//! Two-part playlist: played history plus upcoming queue
//!
//! The logical playlist is `history ++ upcoming`, addressed with 1-based
//! indices. The boundary between the two queues is the "now playing"
//! position and always equals `history.len()`; every mutation here keeps
//! that invariant intact while preserving total membership.
//!
//! [`Playlist`] is a plain synchronous structure so the index arithmetic is
//! directly testable. [`SharedPlaylist`] wraps it for concurrent use by the
//! consumer loop and command handlers.

use crate::error::{PlaybackError, Result};
use crate::queue::OrderedQueue;
use crate::types::{Enqueueable, Playable, RequesterId};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Ordered playlist split into played history and upcoming tracks
///
/// Indexing is strict: every operation taking a logical index fails with
/// [`PlaybackError::IndexOutOfRange`] instead of clamping, so invariants
/// stay auditable. Callers that want clamping do it above this layer.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    /// Already played, oldest first; tail = most recently played / current
    history: OrderedQueue,

    /// Not yet played, soonest first
    upcoming: OrderedQueue,
}

impl Playlist {
    /// Create a new empty playlist
    pub fn new() -> Self {
        Self {
            history: OrderedQueue::new(),
            upcoming: OrderedQueue::new(),
        }
    }

    /// Total number of tracks (history + upcoming)
    pub fn len(&self) -> usize {
        self.history.len() + self.upcoming.len()
    }

    /// Check if both queues are empty
    pub fn is_empty(&self) -> bool {
        self.history.is_empty() && self.upcoming.is_empty()
    }

    /// Number of already-played tracks
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Number of not-yet-played tracks
    pub fn upcoming_len(&self) -> usize {
        self.upcoming.len()
    }

    /// 1-based logical position of the boundary (equals `history_len`)
    pub fn now_playing_index(&self) -> usize {
        self.history.len()
    }

    /// The most recently played / currently playing track, if any
    pub fn now_playing(&self) -> Option<&Playable> {
        self.history.iter().last()
    }

    /// Snapshot of the whole logical playlist, history first
    pub fn entries(&self) -> Vec<Playable> {
        self.history
            .iter()
            .chain(self.upcoming.iter())
            .cloned()
            .collect()
    }

    /// Snapshot of the upcoming queue only (for queue display)
    pub fn upcoming_entries(&self) -> Vec<Playable> {
        self.upcoming.iter().cloned().collect()
    }

    // ===== Enqueue / consume =====

    /// Enqueue one track or an ordered batch
    ///
    /// With `to_front` the request is inserted immediately after the
    /// boundary (plays next); a batch keeps its own order at the front,
    /// which means prepending its items in reverse.
    pub fn push_entry(&mut self, entry: Enqueueable, to_front: bool) {
        match entry {
            Enqueueable::Single(item) => {
                if to_front {
                    self.upcoming.push_front(item);
                } else {
                    self.upcoming.append(item);
                }
            }
            Enqueueable::Batch(items) => {
                if to_front {
                    for item in items.into_iter().rev() {
                        self.upcoming.push_front(item);
                    }
                } else {
                    self.upcoming.extend(items);
                }
            }
        }
    }

    /// Remove and return the next upcoming track, if any
    ///
    /// This is the consumer's only consumption primitive; the suspending
    /// variant lives on [`SharedPlaylist`].
    pub fn pop_next(&mut self) -> Option<Playable> {
        self.upcoming.pop_front()
    }

    /// Record a track as played, moving the boundary forward by one
    pub fn commit_played(&mut self, item: Playable) {
        self.history.append(item);
    }

    // ===== Boundary relocation =====

    /// Move the boundary so `now_playing_index` becomes `index`
    ///
    /// Moving backward pulls the most recently played tracks from the tail
    /// of history back onto the front of upcoming; moving forward pulls
    /// tracks from the front of upcoming onto the tail of history. Relative
    /// order is preserved on both sides. Valid targets are `[0, len]`;
    /// calling it twice with the same target is a no-op the second time.
    pub fn shift_to(&mut self, index: usize) -> Result<()> {
        let len = self.len();
        if index > len {
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }

        let current = self.history.len();
        if index < current {
            for _ in 0..current - index {
                if let Some(item) = self.history.pop_back() {
                    self.upcoming.push_front(item);
                }
            }
        } else {
            for _ in 0..index - current {
                if let Some(item) = self.upcoming.pop_front() {
                    self.history.append(item);
                }
            }
        }
        Ok(())
    }

    // ===== Mutation by logical index =====

    /// Remove the track at a 1-based logical index
    ///
    /// Removing from history shortens it (and thereby lowers
    /// `now_playing_index`); the boundary itself is never shifted.
    pub fn remove_at(&mut self, index: usize) -> Result<Playable> {
        let len = self.len();
        if index == 0 || index > len {
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }

        let h = self.history.len();
        if index <= h {
            self.history.remove_at(index - 1)
        } else {
            self.upcoming.remove_at(index - 1 - h)
        }
    }

    /// Move the track at `old` to logical position `new`
    ///
    /// If the moved track was the boundary track, the boundary follows it:
    /// bookkeeping changes, playback does not stop.
    pub fn move_song(&mut self, old: usize, new: usize) -> Result<()> {
        let len = self.len();
        if old == 0 || old > len {
            return Err(PlaybackError::IndexOutOfRange { index: old, len });
        }
        if new == 0 || new > len {
            return Err(PlaybackError::IndexOutOfRange { index: new, len });
        }
        if old == new {
            return Ok(());
        }

        let was_boundary = old == self.now_playing_index();
        let item = self.remove_at(old)?;
        self.insert_at_logical(new, item);
        if was_boundary {
            self.shift_to(new)?;
        }
        Ok(())
    }

    /// Insert at a 1-based logical position (history side if `index` falls
    /// within it, upcoming side otherwise)
    fn insert_at_logical(&mut self, index: usize, item: Playable) {
        let h = self.history.len();
        if index <= h {
            self.history.insert_at(index - 1, item);
        } else {
            self.upcoming.insert_at(index - 1 - h, item);
        }
    }

    // ===== Filtering rebuilds =====

    /// Remove every track requested by one of `ids`; returns count removed
    pub fn remove_requesters(&mut self, ids: &[RequesterId]) -> usize {
        self.rebuild_filtered(|_, item| !ids.contains(&item.requester))
    }

    /// Keep at most one track per url, first occurrence wins; returns count
    /// removed
    pub fn remove_duplicates(&mut self) -> usize {
        let mut seen: HashSet<String> = HashSet::new();
        self.rebuild_filtered(|_, item| seen.insert(item.url.clone()))
    }

    /// Remove upcoming tracks whose requester is not in `present`; history
    /// is left alone. Returns count removed.
    pub fn remove_absent(&mut self, present: &[RequesterId]) -> usize {
        self.rebuild_filtered(|played, item| played || present.contains(&item.requester))
    }

    /// Rebuild the logical playlist keeping only tracks the predicate
    /// accepts, then restore the boundary to wherever the kept played
    /// tracks end. The predicate sees whether the track sat on the history
    /// side.
    fn rebuild_filtered<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(bool, &Playable) -> bool,
    {
        let boundary = self.history.len();
        let mut all = self.history.drain_all();
        all.extend(self.upcoming.drain_all());
        let total = all.len();

        let mut kept = Vec::with_capacity(total);
        let mut new_boundary = 0;
        for (pos, item) in all.into_iter().enumerate() {
            let played = pos < boundary;
            if keep(played, &item) {
                kept.push(item);
                if played {
                    new_boundary = kept.len();
                }
            }
        }

        let removed = total - kept.len();
        self.push_entry(Enqueueable::Batch(kept), false);
        // Cannot fail: new_boundary <= kept length by construction
        let _ = self.shift_to(new_boundary);
        removed
    }

    // ===== History tail =====

    /// Pop the most recently played track off history
    pub fn pop_last(&mut self) -> Result<Playable> {
        let len = self.history.len();
        self.history
            .pop_back()
            .ok_or(PlaybackError::IndexOutOfRange { index: 1, len })
    }

    /// Pop the last two history tracks, returned as `(prior, current)`
    pub fn pop_last_two(&mut self) -> Result<(Playable, Playable)> {
        let len = self.history.len();
        if len < 2 {
            return Err(PlaybackError::IndexOutOfRange { index: 2, len });
        }
        match (self.history.pop_back(), self.history.pop_back()) {
            (Some(current), Some(prior)) => Ok((prior, current)),
            _ => Err(PlaybackError::IndexOutOfRange { index: 2, len }),
        }
    }

    // ===== Bulk =====

    /// Shuffle the upcoming queue in place; history order is untouched
    pub fn shuffle_upcoming(&mut self) {
        self.upcoming.shuffle();
    }

    /// Remove everything from both queues
    pub fn clear(&mut self) {
        self.history.clear();
        self.upcoming.clear();
    }
}

/// Cloneable concurrent handle around a [`Playlist`]
///
/// One consumer task awaits [`SharedPlaylist::pop_next`] while command
/// handlers mutate the playlist through [`SharedPlaylist::with`]; a single
/// mutex serializes all access and a [`Notify`] wakes the consumer whenever
/// a mutation may have produced an upcoming track. Designed for exactly one
/// consumer (the scheduler loop).
#[derive(Clone, Default)]
pub struct SharedPlaylist {
    inner: Arc<Mutex<Playlist>>,
    available: Arc<Notify>,
}

impl SharedPlaylist {
    /// Create a handle around an empty playlist
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Playlist::new())),
            available: Arc::new(Notify::new()),
        }
    }

    /// Enqueue and wake the consumer
    pub async fn push_entry(&self, entry: Enqueueable, to_front: bool) {
        {
            let mut playlist = self.inner.lock().await;
            playlist.push_entry(entry, to_front);
        }
        self.available.notify_one();
    }

    /// Remove and return the next upcoming track, suspending while the
    /// upcoming queue is empty
    ///
    /// Must only be awaited by the single consumer task; a stored permit on
    /// the notifier covers the race between the emptiness check and the
    /// wait.
    pub async fn pop_next(&self) -> Playable {
        loop {
            if let Some(item) = self.inner.lock().await.pop_next() {
                return item;
            }
            self.available.notified().await;
        }
    }

    /// Run a closure over the locked playlist
    ///
    /// The consumer is woken afterwards since any mutation (a shift, a
    /// requeue from history) may have made upcoming tracks available.
    pub async fn with<R>(&self, f: impl FnOnce(&mut Playlist) -> R) -> R {
        let result = {
            let mut playlist = self.inner.lock().await;
            f(&mut playlist)
        };
        self.available.notify_one();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn track(url: &str, requester: u64) -> Playable {
        Playable {
            title: format!("Track {}", url),
            url: url.to_string(),
            requester: RequesterId(requester),
            duration: Duration::from_secs(200),
        }
    }

    fn urls(playlist: &Playlist) -> Vec<String> {
        playlist.entries().into_iter().map(|t| t.url).collect()
    }

    /// history = played urls (in play order), upcoming = queued urls
    fn build(played: &[&str], queued: &[&str]) -> Playlist {
        let mut playlist = Playlist::new();
        for url in played {
            playlist.commit_played(track(url, 1));
        }
        for url in queued {
            playlist.push_entry(track(url, 1).into(), false);
        }
        playlist
    }

    #[test]
    fn empty_playlist() {
        let playlist = Playlist::new();
        assert!(playlist.is_empty());
        assert_eq!(playlist.now_playing_index(), 0);
        assert!(playlist.now_playing().is_none());
    }

    #[test]
    fn push_and_pop_preserve_order() {
        let mut playlist = Playlist::new();
        playlist.push_entry(track("a", 1).into(), false);
        playlist.push_entry(track("b", 1).into(), false);
        playlist.push_entry(track("c", 1).into(), false);

        assert_eq!(playlist.pop_next().unwrap().url, "a");
        assert_eq!(playlist.pop_next().unwrap().url, "b");
        assert_eq!(playlist.pop_next().unwrap().url, "c");
        assert!(playlist.pop_next().is_none());
    }

    #[test]
    fn batch_to_front_preserves_batch_order() {
        let mut playlist = build(&[], &["x", "y"]);
        playlist.push_entry(vec![track("a", 1), track("b", 1), track("c", 1)].into(), true);

        assert_eq!(urls(&playlist), vec!["a", "b", "c", "x", "y"]);
    }

    #[test]
    fn commit_played_moves_boundary() {
        let mut playlist = Playlist::new();
        playlist.push_entry(track("a", 1).into(), false);

        let item = playlist.pop_next().unwrap();
        assert_eq!(playlist.now_playing_index(), 0);
        playlist.commit_played(item);
        assert_eq!(playlist.now_playing_index(), 1);
        assert_eq!(playlist.now_playing().unwrap().url, "a");
    }

    #[test]
    fn shift_backward_pulls_history_in_order() {
        let mut playlist = build(&["a", "b", "c"], &["d"]);

        playlist.shift_to(1).unwrap();
        assert_eq!(playlist.now_playing_index(), 1);
        assert_eq!(playlist.history_len(), 1);
        // b and c return to upcoming in original order, ahead of d
        assert_eq!(urls(&playlist), vec!["a", "b", "c", "d"]);
        assert_eq!(playlist.pop_next().unwrap().url, "b");
    }

    #[test]
    fn shift_forward_pulls_upcoming_in_order() {
        let mut playlist = build(&["a"], &["b", "c", "d"]);

        playlist.shift_to(3).unwrap();
        assert_eq!(playlist.now_playing_index(), 3);
        assert_eq!(playlist.now_playing().unwrap().url, "c");
        assert_eq!(urls(&playlist), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn shift_to_is_idempotent() {
        for target in 0..=4 {
            let mut once = build(&["a", "b"], &["c", "d"]);
            once.shift_to(target).unwrap();
            let mut twice = build(&["a", "b"], &["c", "d"]);
            twice.shift_to(target).unwrap();
            twice.shift_to(target).unwrap();

            assert_eq!(urls(&once), urls(&twice));
            assert_eq!(once.now_playing_index(), twice.now_playing_index());
            assert_eq!(once.now_playing_index(), target);
        }
    }

    #[test]
    fn shift_out_of_range() {
        let mut playlist = build(&["a"], &["b"]);
        assert!(playlist.shift_to(3).is_err());
        // State unchanged on failure
        assert_eq!(playlist.now_playing_index(), 1);
    }

    #[test]
    fn remove_at_translates_indices() {
        let mut playlist = build(&["a", "b"], &["c", "d"]);

        // Logical 3 is the first upcoming track
        let removed = playlist.remove_at(3).unwrap();
        assert_eq!(removed.url, "c");
        assert_eq!(playlist.now_playing_index(), 2);

        // Logical 1 is in history; boundary drops with it
        let removed = playlist.remove_at(1).unwrap();
        assert_eq!(removed.url, "a");
        assert_eq!(playlist.now_playing_index(), 1);
        assert_eq!(urls(&playlist), vec!["b", "d"]);
    }

    #[test]
    fn remove_at_strict_bounds() {
        let mut playlist = Playlist::new();
        assert!(playlist.remove_at(1).is_err());

        let mut playlist = build(&["a"], &["b"]);
        assert!(playlist.remove_at(0).is_err());
        assert!(playlist.remove_at(3).is_err());
        assert_eq!(playlist.len(), 2);
    }

    #[test]
    fn move_song_within_upcoming() {
        let mut playlist = build(&["a"], &["b", "c", "d"]);

        playlist.move_song(2, 4).unwrap();
        assert_eq!(urls(&playlist), vec!["a", "c", "d", "b"]);
        assert_eq!(playlist.now_playing_index(), 1);
    }

    #[test]
    fn move_song_roundtrip_restores_order() {
        let original = build(&["a", "b"], &["c", "d", "e"]);
        let boundary = original.now_playing_index();

        for old in 1..=5usize {
            for new in 1..=5usize {
                if old == boundary {
                    continue; // boundary moves change bookkeeping, exempt
                }
                let mut playlist = original.clone();
                playlist.move_song(old, new).unwrap();
                playlist.move_song(new, old).unwrap();
                assert_eq!(
                    urls(&playlist),
                    urls(&original),
                    "move({},{}) then back",
                    old,
                    new
                );
            }
        }
    }

    #[test]
    fn move_boundary_song_carries_boundary() {
        let mut playlist = build(&["a", "b"], &["c", "d"]);

        // b is the boundary track; move it to the end
        playlist.move_song(2, 4).unwrap();
        assert_eq!(urls(&playlist), vec!["a", "c", "d", "b"]);
        assert_eq!(playlist.now_playing_index(), 4);
        assert_eq!(playlist.now_playing().unwrap().url, "b");
    }

    #[test]
    fn move_song_out_of_bounds() {
        let mut playlist = build(&["a"], &["b"]);
        assert!(playlist.move_song(1, 7).is_err());
        assert!(playlist.move_song(0, 1).is_err());
        assert!(playlist.move_song(9, 1).is_err());
        assert_eq!(urls(&playlist), vec!["a", "b"]);
    }

    #[test]
    fn remove_requesters_exact() {
        let mut playlist = Playlist::new();
        playlist.commit_played(track("a", 1));
        playlist.push_entry(track("b", 2).into(), false);
        playlist.push_entry(track("c", 1).into(), false);
        playlist.push_entry(track("d", 3).into(), false);

        let removed = playlist.remove_requesters(&[RequesterId(1)]);
        assert_eq!(removed, 2);
        assert_eq!(urls(&playlist), vec!["b", "d"]);
        // The only played track was removed, boundary lands at zero
        assert_eq!(playlist.now_playing_index(), 0);
    }

    #[test]
    fn remove_duplicates_keeps_first_occurrence() {
        let mut playlist = Playlist::new();
        playlist.commit_played(track("a", 1));
        playlist.push_entry(track("b", 1).into(), false);
        playlist.push_entry(track("a", 2).into(), false);
        playlist.push_entry(track("b", 3).into(), false);
        playlist.push_entry(track("c", 1).into(), false);

        let removed = playlist.remove_duplicates();
        assert_eq!(removed, 2);
        assert_eq!(urls(&playlist), vec!["a", "b", "c"]);
        assert_eq!(playlist.now_playing_index(), 1);
    }

    #[test]
    fn remove_absent_spares_history() {
        let mut playlist = Playlist::new();
        playlist.commit_played(track("a", 9)); // requester gone, but played
        playlist.push_entry(track("b", 1).into(), false);
        playlist.push_entry(track("c", 9).into(), false);

        let removed = playlist.remove_absent(&[RequesterId(1)]);
        assert_eq!(removed, 1);
        assert_eq!(urls(&playlist), vec!["a", "b"]);
        assert_eq!(playlist.now_playing_index(), 1);
    }

    #[test]
    fn pop_last_two_returns_prior_then_current() {
        let mut playlist = build(&["a", "b"], &[]);

        let (prior, current) = playlist.pop_last_two().unwrap();
        assert_eq!(prior.url, "a");
        assert_eq!(current.url, "b");
        assert_eq!(playlist.history_len(), 0);
    }

    #[test]
    fn pop_last_requires_history() {
        let mut playlist = build(&[], &["a"]);
        assert!(playlist.pop_last().is_err());
        let mut playlist = build(&["a"], &[]);
        assert!(playlist.pop_last_two().is_err());
    }

    #[test]
    fn previous_replay_scenario() {
        // A played first, B current; previous() re-pushes [A, B] up front
        let mut playlist = build(&["a", "b"], &["c"]);

        let (prior, current) = playlist.pop_last_two().unwrap();
        playlist.push_entry(vec![prior, current].into(), true);

        assert_eq!(playlist.now_playing_index(), 0);
        assert_eq!(playlist.pop_next().unwrap().url, "a");
        assert_eq!(urls(&playlist), vec!["b", "c"]);
    }

    #[test]
    fn front_push_after_first_track_scenario() {
        let mut playlist = Playlist::new();
        for url in ["a", "b", "c"] {
            playlist.push_entry(track(url, 1).into(), false);
        }

        let first = playlist.pop_next().unwrap();
        assert_eq!(first.url, "a");
        playlist.commit_played(first);
        playlist.push_entry(track("d", 1).into(), true);

        assert_eq!(urls(&playlist), vec!["a", "d", "b", "c"]);
        assert_eq!(playlist.now_playing_index(), 1);

        // Relocate the boundary two ahead: a and d count as played
        playlist.shift_to(2).unwrap();
        assert_eq!(playlist.now_playing_index(), 2);
        assert_eq!(playlist.now_playing().unwrap().url, "d");
        assert_eq!(playlist.upcoming_entries().len(), 2);
        assert_eq!(playlist.pop_next().unwrap().url, "b");
    }

    #[test]
    fn clear_empties_everything() {
        let mut playlist = build(&["a"], &["b", "c"]);
        playlist.clear();
        assert!(playlist.is_empty());
        assert_eq!(playlist.now_playing_index(), 0);
    }

    #[tokio::test]
    async fn shared_pop_waits_for_push() {
        let shared = SharedPlaylist::new();
        let consumer = {
            let shared = shared.clone();
            tokio::spawn(async move { shared.pop_next().await })
        };

        // Give the consumer time to reach the empty-queue wait
        tokio::time::sleep(Duration::from_millis(20)).await;
        shared.push_entry(track("a", 1).into(), false).await;

        let got = consumer.await.unwrap();
        assert_eq!(got.url, "a");
    }

    #[tokio::test]
    async fn shared_with_wakes_consumer() {
        let shared = SharedPlaylist::new();

        // Park a played track in history, then start a waiting consumer
        shared.with(|p| p.commit_played(track("a", 1))).await;
        let consumer = {
            let shared = shared.clone();
            tokio::spawn(async move { shared.pop_next().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // A backward shift re-exposes the track as upcoming
        shared.with(|p| p.shift_to(0)).await.unwrap();
        let got = consumer.await.unwrap();
        assert_eq!(got.url, "a");
    }
}
