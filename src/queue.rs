//! Ordered queue of playable tracks
//!
//! Random-access sequence with stable insertion order, O(1) operations at
//! both ends and O(n) arbitrary insert/remove. Pure container: it never
//! touches external resources. Blocking semantics for an empty queue live
//! one layer up, in [`crate::playlist::SharedPlaylist`].

use crate::error::{PlaybackError, Result};
use crate::types::Playable;
use rand::seq::SliceRandom;
use rand::thread_rng;
use std::collections::VecDeque;

/// Ordered sequence of tracks
///
/// Indices are always physical positions in `[0, len)`; removing index `i`
/// shifts every position above it down by one.
#[derive(Debug, Clone, Default)]
pub struct OrderedQueue {
    items: VecDeque<Playable>,
}

impl OrderedQueue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    /// Number of tracks in the queue
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a track to the back
    pub fn append(&mut self, item: Playable) {
        self.items.push_back(item);
    }

    /// Prepend a track to the front
    pub fn push_front(&mut self, item: Playable) {
        self.items.push_front(item);
    }

    /// Remove and return the front track, if any
    pub fn pop_front(&mut self) -> Option<Playable> {
        self.items.pop_front()
    }

    /// Remove and return the back track, if any
    pub fn pop_back(&mut self) -> Option<Playable> {
        self.items.pop_back()
    }

    /// Get the track at `index`
    pub fn get(&self, index: usize) -> Result<&Playable> {
        self.items.get(index).ok_or(PlaybackError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Copy out the tracks in `[start, end)`
    ///
    /// Fails if the range does not lie fully inside the queue.
    pub fn slice(&self, start: usize, end: usize) -> Result<Vec<Playable>> {
        if start > end || end > self.items.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index: end,
                len: self.items.len(),
            });
        }
        Ok(self.items.range(start..end).cloned().collect())
    }

    /// Remove and return the track at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<Playable> {
        self.items.remove(index).ok_or(PlaybackError::IndexOutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Insert a track at `index`, clamping into `[0, len]`
    pub fn insert_at(&mut self, index: usize, item: Playable) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    /// Shuffle the queue in place (uniform permutation)
    pub fn shuffle(&mut self) {
        let mut rng = thread_rng();
        self.items.make_contiguous().shuffle(&mut rng);
    }

    /// Remove all tracks
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drain every track, front first
    pub fn drain_all(&mut self) -> Vec<Playable> {
        self.items.drain(..).collect()
    }

    /// Iterate front to back
    pub fn iter(&self) -> impl Iterator<Item = &Playable> {
        self.items.iter()
    }
}

impl Extend<Playable> for OrderedQueue {
    fn extend<T: IntoIterator<Item = Playable>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}
