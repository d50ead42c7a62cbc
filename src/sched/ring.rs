// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduling ring
//!
//! Circular membership over every live thread. The ring is anchored at a
//! head; "next" of the last entry wraps back to the head. New threads and
//! requeued threads are inserted at the tail, just before the head, so the
//! ring runs from least recently dispatched to most recently dispatched.
//!
//! Traversal order decides which candidate the scheduler checks first, so
//! it is part of the scheduling contract.
//!
//! Threads are boxed: a thread's context never moves while other entries
//! are inserted or removed, which keeps raw context pointers valid across
//! a switch.

use std::collections::VecDeque;

use super::thread::{Thread, ThreadId};

/// Ring of thread control blocks
#[derive(Debug, Default)]
pub struct Ring {
    threads: VecDeque<Box<Thread>>,
}

impl Ring {
    /// Create an empty ring
    pub fn new() -> Self {
        Self {
            threads: VecDeque::new(),
        }
    }

    /// Number of threads in the ring
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Check if the ring is empty
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Insert a thread at the traversal tail
    pub fn push(&mut self, thread: Box<Thread>) {
        self.threads.push_back(thread);
    }

    /// Position of a thread, counted from the head
    fn position(&self, id: ThreadId) -> Option<usize> {
        self.threads.iter().position(|t| t.id == id)
    }

    /// Get a thread by ID
    pub fn get(&self, id: ThreadId) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == id).map(|t| &**t)
    }

    /// Get a mutable reference to a thread
    pub fn get_mut(&mut self, id: ThreadId) -> Option<&mut Thread> {
        self.threads.iter_mut().find(|t| t.id == id).map(|t| &mut **t)
    }

    /// Remove a thread from its position
    pub fn remove(&mut self, id: ThreadId) -> Option<Box<Thread>> {
        let index = self.position(id)?;
        self.threads.remove(index)
    }

    /// Move a thread to the traversal tail
    ///
    /// Returns false if the thread is not in the ring.
    pub fn requeue(&mut self, id: ThreadId) -> bool {
        match self.remove(id) {
            Some(thread) => {
                self.threads.push_back(thread);
                true
            }
            None => false,
        }
    }

    /// Visit every thread other than `start`, in traversal order
    ///
    /// The walk begins at the entry after `start` and wraps around the
    /// ring, stopping just before `start`. If `start` is not in the ring
    /// the walk is empty.
    pub fn others(&self, start: ThreadId) -> impl Iterator<Item = &Thread> + '_ {
        let len = self.threads.len();
        let (begin, count) = match self.position(start) {
            Some(index) => (index + 1, len - 1),
            None => (0, 0),
        };
        (0..count).map(move |step| &*self.threads[(begin + step) % len])
    }

    /// First thread after `start` in traversal order matching `pred`
    pub fn find_from<P>(&self, start: ThreadId, mut pred: P) -> Option<ThreadId>
    where
        P: FnMut(&Thread) -> bool,
    {
        self.others(start).find(|t| pred(*t)).map(|t| t.id)
    }

    /// Remove every thread matching `pred`, walking once from `start`
    ///
    /// `start` itself is never removed.
    pub fn drain_from<P>(&mut self, start: ThreadId, mut pred: P) -> Vec<Box<Thread>>
    where
        P: FnMut(&Thread) -> bool,
    {
        let doomed: Vec<ThreadId> = self
            .others(start)
            .filter(|t| pred(*t))
            .map(|t| t.id)
            .collect();
        doomed.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Iterate from the head
    pub fn iter(&self) -> impl Iterator<Item = &Thread> + '_ {
        self.threads.iter().map(|t| &**t)
    }
}
