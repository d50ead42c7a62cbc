// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread control block
//!
//! Defines the Thread struct and related types.

use core::fmt;

use super::state::{Condition, ThreadState, NO_CONDITION};
use crate::arch::{Context, EntryPoint};
use crate::mm::{Stack, StackFlags};

/// Thread ID type
pub type ThreadId = u64;

/// ID of the thread that created the scheduler
pub const BOOTSTRAP_THREAD_ID: ThreadId = 0;

/// Thread body: any callable taking and returning nothing
pub type Body = Box<dyn FnOnce() + 'static>;

/// Thread statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadStats {
    /// Number of times this thread has been scheduled
    pub schedule_count: u64,
    /// Number of times this thread gave up the CPU to another thread
    pub voluntary_switches: u64,
}

/// Snapshot of a thread's scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Thread ID
    pub id: ThreadId,
    /// State at the time of the snapshot
    pub state: ThreadState,
    /// Condition the thread waits on, or 0
    pub condition: Condition,
    /// Counters
    pub stats: ThreadStats,
}

/// Thread structure
///
/// The context is only meaningful while the thread is not running: for
/// the running thread the live registers are the context.
pub struct Thread {
    /// Unique thread ID
    pub id: ThreadId,
    /// Thread state
    pub state: ThreadState,
    /// Condition this thread waits on (0 = none)
    pub condition: Condition,
    /// Saved registers
    pub context: Context,
    /// Owned stack; `None` for the bootstrap thread, which runs on the
    /// OS thread's own stack
    pub stack: Option<Stack>,
    /// Body not yet started; taken by the trampoline on first dispatch
    pub body: Option<Body>,
    /// Thread statistics
    pub stats: ThreadStats,
}

impl Thread {
    /// Create the bootstrap thread, already running
    pub fn bootstrap() -> Self {
        Self {
            id: BOOTSTRAP_THREAD_ID,
            state: ThreadState::Running,
            condition: NO_CONDITION,
            context: Context::default(),
            stack: None,
            body: None,
            stats: ThreadStats::default(),
        }
    }

    /// Create a new thread in the `Init` state with its own stack
    pub fn new(id: ThreadId, body: Body, stack_size: usize, stack_flags: StackFlags) -> Self {
        Self {
            id,
            state: ThreadState::Init,
            condition: NO_CONDITION,
            context: Context::default(),
            stack: Some(Stack::new(stack_size, stack_flags)),
            body: Some(body),
            stats: ThreadStats::default(),
        }
    }

    /// Initialize the stack so the first switch runs `entry(arg)`, and
    /// mark the thread ready
    pub fn prime(&mut self, entry: EntryPoint, arg: usize) {
        if let Some(stack) = &self.stack {
            // Safety: the stack is freshly allocated, owned by this thread
            // and not yet running.
            self.context = unsafe { Context::prime(stack.top(), entry, arg) };
            self.state = ThreadState::Ready;
        }
    }

    /// Check if the scheduler may pick this thread
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Check if the thread is ready and waiting on `condition`
    pub fn is_waiting_on(&self, condition: Condition) -> bool {
        self.state.is_ready() && self.condition == condition
    }

    /// Snapshot of this thread
    pub fn info(&self) -> ThreadInfo {
        ThreadInfo {
            id: self.id,
            state: self.state,
            condition: self.condition,
            stats: self.stats,
        }
    }
}

impl fmt::Debug for Thread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("condition", &self.condition)
            .field("stack", &self.stack)
            .field("started", &self.body.is_none())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn idle_entry(_arg: usize) -> ! {
        unreachable!()
    }

    #[test]
    fn test_bootstrap_thread() {
        let thread = Thread::bootstrap();
        assert_eq!(thread.id, BOOTSTRAP_THREAD_ID);
        assert_eq!(thread.state, ThreadState::Running);
        assert!(thread.stack.is_none());
        assert!(thread.body.is_none());
    }

    #[test]
    fn test_new_thread_lifecycle() {
        let mut thread = Thread::new(3, Box::new(|| {}), 16 * 1024, StackFlags::CANARY);
        assert_eq!(thread.state, ThreadState::Init);
        assert!(!thread.is_ready());

        thread.prime(idle_entry, 0);
        assert_eq!(thread.state, ThreadState::Ready);
        assert!(thread.is_ready());
        assert!(thread.body.is_some());
    }

    #[test]
    fn test_waiting_on_requires_ready() {
        let mut thread = Thread::new(1, Box::new(|| {}), 16 * 1024, StackFlags::empty());
        thread.prime(idle_entry, 0);
        thread.condition = 9;
        assert!(thread.is_waiting_on(9));
        assert!(!thread.is_waiting_on(8));

        thread.state = ThreadState::Zombie;
        assert!(!thread.is_waiting_on(9));
    }

    #[test]
    fn test_info_snapshot() {
        let thread = Thread::bootstrap();
        let info = thread.info();
        assert_eq!(info.id, 0);
        assert_eq!(info.state, ThreadState::Running);
        assert_eq!(info.condition, NO_CONDITION);
        assert_eq!(info.stats, ThreadStats::default());
    }
}
