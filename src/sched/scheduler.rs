// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler implementation
//!
//! Cooperative scheduling over the thread ring.
//!
//! # Selection policy
//!
//! `yield_now(c)` with `c != 0` first looks for a READY thread waiting on
//! `c`; otherwise, or if there is none, it takes any READY thread. Both
//! searches walk the ring from the current thread and take the **first**
//! match. Dispatched threads are requeued at the ring's tail, so the first
//! match is the thread dispatched least recently. Because only one thread
//! runs at a time, that is also the thread that has been waiting longest.
//!
//! `wait(c)` tags the caller with `c` and hands off to the first READY
//! thread, whatever its tag.

use core::cell::UnsafeCell;
use core::fmt;
use std::rc::Rc;

use super::ring::Ring;
use super::state::{Condition, ThreadState, NO_CONDITION};
use super::thread::{Body, Thread, ThreadId, ThreadInfo, BOOTSTRAP_THREAD_ID};
use super::trampoline;
use crate::arch::{self, Context};
use crate::config::Config;
use crate::error::SchedError;

/// Mutable scheduler state
struct Inner {
    /// All live threads, in traversal order
    ring: Ring,
    /// Currently running thread
    current: ThreadId,
    /// Next thread ID to hand out
    next_id: ThreadId,
}

/// Contexts handed to the switch primitive once the state is updated
struct Switch {
    from: *mut Context,
    to: *const Context,
}

impl Switch {
    /// Transfer control; returns when the `from` thread is resumed
    ///
    /// # Safety
    ///
    /// Both contexts must belong to threads still owned by the ring.
    unsafe fn run(self) {
        arch::switch_context(self.from, self.to);
    }
}

impl Inner {
    fn thread_mut(&mut self, id: ThreadId) -> &mut Thread {
        match self.ring.get_mut(id) {
            Some(thread) => thread,
            None => panic!("thread {} missing from the scheduling ring", id),
        }
    }

    /// Pick the next thread for `yield_now(condition)`
    fn select(&self, condition: Condition) -> Option<ThreadId> {
        let signaled = if condition != NO_CONDITION {
            self.ring
                .find_from(self.current, |t| t.is_waiting_on(condition))
        } else {
            None
        };
        signaled.or_else(|| self.ring.find_from(self.current, Thread::is_ready))
    }

    /// Make `next` the running thread
    ///
    /// The previous thread becomes READY unless it already left the
    /// RUNNING state (a zombie stays a zombie). `next` moves to the tail
    /// of the ring.
    fn dispatch(&mut self, next: ThreadId) -> Switch {
        let prev = self.current;

        let from = {
            let thread = self.thread_mut(prev);
            if thread.state == ThreadState::Running {
                thread.state = ThreadState::Ready;
            }
            thread.stats.voluntary_switches += 1;
            &mut thread.context as *mut Context
        };

        let to = {
            let thread = self.thread_mut(next);
            thread.state = ThreadState::Running;
            thread.condition = NO_CONDITION;
            thread.stats.schedule_count += 1;
            &thread.context as *const Context
        };

        self.ring.requeue(next);
        self.current = next;

        log::trace!("switch {} -> {}", prev, next);
        Switch { from, to }
    }
}

/// Scheduler
///
/// Owns every thread control block and decides which one runs. A scheduler
/// always lives in an [`Rc`]: spawned threads find their scheduler through
/// its address, so it must never move.
///
/// All state sits behind an `UnsafeCell` and is only touched inside short
/// sections that end before control is transferred. Nothing borrowed from
/// the scheduler is held across a switch.
pub struct Scheduler {
    inner: UnsafeCell<Inner>,
    config: Config,
}

impl Scheduler {
    /// Create a scheduler; the calling code becomes the bootstrap thread
    pub fn new(config: Config) -> Rc<Self> {
        let mut ring = Ring::new();
        ring.push(Box::new(Thread::bootstrap()));

        log::info!(
            "scheduler initialized (stack size {} bytes, flags {:?})",
            config.effective_stack_size(),
            config.stack_flags
        );

        Rc::new(Self {
            inner: UnsafeCell::new(Inner {
                ring,
                current: BOOTSTRAP_THREAD_ID,
                next_id: BOOTSTRAP_THREAD_ID + 1,
            }),
            config,
        })
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        // Safety: the scheduler is !Sync, callers never nest this, and the
        // borrow cannot escape `f`, so it never spans a context switch.
        f(unsafe { &mut *self.inner.get() })
    }

    /// Spawn a new thread running `body`
    ///
    /// The thread gets its own stack and starts READY. Before returning,
    /// the caller yields once, so the new thread (or another READY thread)
    /// may run first.
    pub fn spawn<F>(&self, body: F) -> ThreadId
    where
        F: FnOnce() + 'static,
    {
        let arg = self as *const Scheduler as usize;
        let stack_size = self.config.effective_stack_size();
        let stack_flags = self.config.stack_flags;

        let id = self.with_inner(|inner| {
            let id = inner.next_id;
            inner.next_id += 1;

            let mut thread = Box::new(Thread::new(id, Box::new(body), stack_size, stack_flags));
            thread.prime(trampoline::thread_main, arg);
            inner.ring.push(thread);
            id
        });
        log::trace!("spawned thread {}", id);

        // Always succeeds: the new thread is READY
        let _ = self.yield_now(NO_CONDITION);
        id
    }

    /// Give up the CPU, optionally signaling `condition`
    ///
    /// Returns `Err(SchedError::NoReadyThread)` without changing any state
    /// if no other thread is READY. Otherwise returns once this thread is
    /// scheduled again.
    pub fn yield_now(&self, condition: Condition) -> Result<(), SchedError> {
        let switch = self.with_inner(|inner| {
            let next = inner.select(condition).ok_or(SchedError::NoReadyThread)?;
            let current = inner.current;
            inner.thread_mut(current).condition = NO_CONDITION;
            Ok(inner.dispatch(next))
        })?;

        // Safety: both contexts live in boxed ring entries that gc cannot free
        // while they are current or about to run.
        unsafe { switch.run() };
        Ok(())
    }

    /// Give up the CPU while waiting on `condition`
    ///
    /// The caller is tagged with `condition` so a later
    /// `yield_now(condition)` prefers it. The tag only affects selection
    /// order; any plain yield may also resume the caller.
    pub fn wait(&self, condition: Condition) -> Result<(), SchedError> {
        if condition == NO_CONDITION {
            return Err(SchedError::InvalidCondition);
        }

        let switch = self.with_inner(|inner| {
            let next = inner
                .ring
                .find_from(inner.current, Thread::is_ready)
                .ok_or(SchedError::NoReadyThread)?;
            let current = inner.current;
            inner.thread_mut(current).condition = condition;
            Ok(inner.dispatch(next))
        })?;

        // Safety: as in `yield_now`.
        unsafe { switch.run() };
        Ok(())
    }

    /// Run other threads until none is READY any more
    ///
    /// Meant for the bootstrap thread: it returns once every spawned
    /// thread has exited.
    pub fn join(&self) {
        while self.yield_now(NO_CONDITION).is_ok() {}
        log::debug!("join complete on thread {}", self.current());
    }

    /// Terminate the calling thread
    ///
    /// On the bootstrap thread this terminates the whole process. Any other
    /// thread becomes a zombie and is never scheduled again; its stack is
    /// released by [`Scheduler::gc`]. Locals still alive on the exiting
    /// thread's stack are not dropped.
    pub fn exit(&self) -> ! {
        let id = self.current();
        if id == BOOTSTRAP_THREAD_ID {
            log::info!("bootstrap thread exited, terminating process");
            std::process::exit(0);
        }

        self.with_inner(|inner| inner.thread_mut(id).state = ThreadState::Zombie);
        log::trace!("thread {} exited", id);

        // The bootstrap thread is READY whenever another thread runs
        let result = self.yield_now(NO_CONDITION);
        log::error!("zombie thread {} was resumed ({:?})", id, result);
        std::process::abort()
    }

    /// Reclaim exited threads
    ///
    /// Walks the ring once from the current thread, freeing the stack and
    /// control block of every zombie. Returns how many were reclaimed.
    pub fn gc(&self) -> usize {
        let reclaimed = self.with_inner(|inner| {
            let start = inner.current;
            inner.ring.drain_from(start, |t| t.state.is_zombie())
        });

        // Stacks are released outside the scheduler state
        let count = reclaimed.len();
        drop(reclaimed);

        if count > 0 {
            log::debug!("reclaimed {} zombie threads", count);
        }
        count
    }

    /// ID of the running thread
    pub fn current(&self) -> ThreadId {
        self.with_inner(|inner| inner.current)
    }

    /// Snapshot of one thread
    pub fn thread(&self, id: ThreadId) -> Option<ThreadInfo> {
        self.with_inner(|inner| inner.ring.get(id).map(Thread::info))
    }

    /// Snapshot of every thread, in ring order from the head
    pub fn threads(&self) -> Vec<ThreadInfo> {
        self.with_inner(|inner| inner.ring.iter().map(Thread::info).collect())
    }

    /// Number of threads in the ring, zombies included
    pub fn thread_count(&self) -> usize {
        self.with_inner(|inner| inner.ring.len())
    }

    /// Configuration this scheduler was created with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Take the body of the running thread; used once by the trampoline
    pub(super) fn take_current_body(&self) -> Option<Body> {
        self.with_inner(|inner| {
            let current = inner.current;
            inner.thread_mut(current).body.take()
        })
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if inner.current != BOOTSTRAP_THREAD_ID {
            // Dropping now would free the stack we are running on
            log::error!("scheduler dropped on green thread {}", inner.current);
            std::process::abort();
        }
        log::debug!("scheduler torn down with {} threads", inner.ring.len());
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("current", &self.current())
            .field("threads", &self.thread_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::{Cell, RefCell};

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn new_log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn scheduler() -> Rc<Scheduler> {
        Scheduler::new(Config::new().with_stack_size(64 * 1024))
    }

    fn running_count(sched: &Scheduler) -> usize {
        sched
            .threads()
            .iter()
            .filter(|t| t.state == ThreadState::Running)
            .count()
    }

    fn ring_ids(sched: &Scheduler) -> Vec<ThreadId> {
        sched.threads().iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_new_scheduler() {
        let sched = scheduler();
        assert_eq!(sched.current(), BOOTSTRAP_THREAD_ID);
        assert_eq!(sched.thread_count(), 1);

        let boot = sched.thread(BOOTSTRAP_THREAD_ID).unwrap();
        assert_eq!(boot.state, ThreadState::Running);
        assert_eq!(boot.condition, NO_CONDITION);
        assert_eq!(sched.config().effective_stack_size(), 64 * 1024);
    }

    #[test]
    fn test_yield_alone_fails() {
        let sched = scheduler();
        let before = sched.threads();

        assert_eq!(sched.yield_now(NO_CONDITION), Err(SchedError::NoReadyThread));
        assert_eq!(sched.yield_now(3), Err(SchedError::NoReadyThread));

        assert_eq!(sched.threads(), before);
        assert_eq!(sched.current(), BOOTSTRAP_THREAD_ID);
    }

    #[test]
    fn test_wait_rejects_zero_condition() {
        let sched = scheduler();
        assert_eq!(sched.wait(NO_CONDITION), Err(SchedError::InvalidCondition));
    }

    #[test]
    fn test_wait_alone_leaves_state_unchanged() {
        let sched = scheduler();
        let before = sched.threads();

        assert_eq!(sched.wait(4), Err(SchedError::NoReadyThread));
        assert_eq!(sched.threads(), before);
        assert_eq!(sched.thread(0).unwrap().condition, NO_CONDITION);
    }

    #[test]
    fn test_spawn_runs_once_before_returning() {
        let sched = scheduler();
        let log = new_log();

        let l = log.clone();
        let first = sched.spawn(move || l.borrow_mut().push("first"));
        assert_eq!(first, 1);
        assert_eq!(*log.borrow(), vec!["first"]);
        assert_eq!(sched.thread(first).unwrap().state, ThreadState::Zombie);

        let l = log.clone();
        let second = sched.spawn(move || l.borrow_mut().push("second"));
        assert_eq!(second, 2);
        assert_eq!(*log.borrow(), vec!["first", "second"]);

        assert_eq!(sched.current(), BOOTSTRAP_THREAD_ID);
        assert_eq!(running_count(&sched), 1);
    }

    #[test]
    fn test_explicit_exit_then_join_and_gc() {
        let sched = scheduler();
        let log = new_log();

        let (s, l) = (sched.clone(), log.clone());
        let id = sched.spawn(move || {
            l.borrow_mut().push("before exit");
            s.exit();
        });

        sched.join();
        assert_eq!(*log.borrow(), vec!["before exit"]);
        assert_eq!(sched.thread(id).unwrap().state, ThreadState::Zombie);

        assert_eq!(sched.gc(), 1);
        assert_eq!(ring_ids(&sched), vec![BOOTSTRAP_THREAD_ID]);
        assert_eq!(sched.thread(BOOTSTRAP_THREAD_ID).unwrap().state, ThreadState::Running);
    }

    #[test]
    fn test_join_runs_every_thread_to_completion() {
        let sched = scheduler();
        let turns = Rc::new(RefCell::new(Vec::new()));
        let violations = Rc::new(Cell::new(0));

        let mut ids = Vec::new();
        for _ in 0..3 {
            let (s, t, v) = (sched.clone(), turns.clone(), violations.clone());
            ids.push(sched.spawn(move || {
                for _ in 0..3 {
                    let me = s.current();
                    if running_count(&s) != 1 || s.thread(me).unwrap().state != ThreadState::Running {
                        v.set(v.get() + 1);
                    }
                    t.borrow_mut().push(me);
                    let _ = s.yield_now(NO_CONDITION);
                }
            }));
        }
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(sched.thread_count(), 4);

        sched.join();

        assert_eq!(violations.get(), 0);
        for id in &ids {
            let runs = turns.borrow().iter().filter(|&t| t == id).count();
            assert_eq!(runs, 3);
            assert_eq!(sched.thread(*id).unwrap().state, ThreadState::Zombie);
        }
        assert_eq!(sched.yield_now(NO_CONDITION), Err(SchedError::NoReadyThread));

        assert_eq!(sched.gc(), 3);
        assert_eq!(sched.gc(), 0);
        assert_eq!(sched.thread_count(), 1);
    }

    #[test]
    fn test_signal_prefers_matching_waiter() {
        let sched = scheduler();
        let log = new_log();
        let done = Rc::new(Cell::new(false));

        let (s, l, d) = (sched.clone(), log.clone(), done.clone());
        let a = sched.spawn(move || loop {
            l.borrow_mut().push("A");
            if d.get() {
                break;
            }
            let _ = s.wait(7);
        });

        let (s, l, d) = (sched.clone(), log.clone(), done.clone());
        let c = sched.spawn(move || loop {
            l.borrow_mut().push("C");
            if d.get() {
                break;
            }
            let _ = s.wait(8);
        });

        // C's wait handed off to A, the least recently dispatched thread
        assert_eq!(*log.borrow(), vec!["A", "C", "A"]);
        assert_eq!(ring_ids(&sched), vec![c, a, BOOTSTRAP_THREAD_ID]);
        assert_eq!(sched.thread(a).unwrap().condition, 7);
        assert_eq!(sched.thread(c).unwrap().condition, 8);

        // C comes first in traversal order, but only A waits on 7
        sched.yield_now(7).unwrap();
        assert_eq!(*log.borrow(), vec!["A", "C", "A", "A", "C"]);

        // Now A comes first, but only C waits on 8
        assert_eq!(ring_ids(&sched), vec![a, c, BOOTSTRAP_THREAD_ID]);
        sched.yield_now(8).unwrap();
        assert_eq!(*log.borrow(), vec!["A", "C", "A", "A", "C", "C", "A"]);

        done.set(true);
        sched.join();
        assert_eq!(sched.gc(), 2);
        assert_eq!(sched.thread_count(), 1);
    }

    #[test]
    fn test_two_waiters_and_a_signaler() {
        let sched = scheduler();
        let log = new_log();
        let violations = Rc::new(Cell::new(0));

        let (s, l, v) = (sched.clone(), log.clone(), violations.clone());
        sched.spawn(move || {
            let _ = s.wait(5);
            if running_count(&s) != 1 {
                v.set(v.get() + 1);
            }
            l.borrow_mut().push("W1");
        });

        let (s, l, v) = (sched.clone(), log.clone(), violations.clone());
        sched.spawn(move || {
            let _ = s.wait(5);
            if running_count(&s) != 1 {
                v.set(v.get() + 1);
            }
            l.borrow_mut().push("W2");
        });

        let (s, l) = (sched.clone(), log.clone());
        sched.spawn(move || {
            l.borrow_mut().push("S1");
            let _ = s.yield_now(5);
            l.borrow_mut().push("S2");
            let _ = s.yield_now(5);
            l.borrow_mut().push("S3");
        });

        sched.join();

        // W1 is resumed by W2's wait; S's first signal wakes W2; the second
        // signal finds no waiter and falls back to the bootstrap thread.
        assert_eq!(*log.borrow(), vec!["W1", "S1", "W2", "S2", "S3"]);
        assert_eq!(violations.get(), 0);
        assert_eq!(sched.gc(), 3);
        assert_eq!(sched.thread_count(), 1);
    }

    #[test]
    fn test_signal_wakes_longest_waiter_first() {
        let sched = scheduler();
        let log = new_log();
        let violations = Rc::new(Cell::new(0));

        fn waiter(s: Rc<Scheduler>, l: Log, v: Rc<Cell<u32>>, name: &'static str) -> impl FnOnce() {
            move || {
                l.borrow_mut().push("waits");
                let _ = s.wait(5);
                if running_count(&s) != 1 {
                    v.set(v.get() + 1);
                }
                l.borrow_mut().push(name);
            }
        }

        // Parks once, then spawns the second waiter after the first one waits
        let (s, l, v) = (sched.clone(), log.clone(), violations.clone());
        let spawner = sched.spawn(move || {
            l.borrow_mut().push("spawner");
            let _ = s.yield_now(NO_CONDITION);
            let b = waiter(s.clone(), l.clone(), v, "B");
            s.spawn(b);
            l.borrow_mut().push("spawner done");
        });
        let a = sched.spawn(waiter(sched.clone(), log.clone(), violations.clone(), "A"));

        // Both waiters are READY on the same condition; A has waited longer
        let b = 3;
        assert_eq!(ring_ids(&sched), vec![a, spawner, b, BOOTSTRAP_THREAD_ID]);
        assert_eq!(sched.thread(a).unwrap().condition, 5);
        assert_eq!(sched.thread(b).unwrap().condition, 5);
        assert_eq!(sched.thread(b).unwrap().state, ThreadState::Ready);
        assert_eq!(*log.borrow(), vec!["spawner", "waits", "waits"]);

        sched.yield_now(5).unwrap();
        assert_eq!(sched.yield_now(5), Err(SchedError::NoReadyThread));

        assert_eq!(
            *log.borrow(),
            vec!["spawner", "waits", "waits", "A", "spawner done", "B"]
        );
        assert_eq!(violations.get(), 0);
        assert_eq!(sched.gc(), 3);
    }

    #[test]
    fn test_gc_only_reclaims_zombies() {
        let sched = scheduler();
        let done = Rc::new(Cell::new(false));

        let finished = sched.spawn(|| {});

        let (s, d) = (sched.clone(), done.clone());
        let looping = sched.spawn(move || loop {
            if d.get() {
                break;
            }
            let _ = s.yield_now(NO_CONDITION);
        });

        assert_eq!(sched.thread(finished).unwrap().state, ThreadState::Zombie);
        assert_eq!(sched.thread(looping).unwrap().state, ThreadState::Ready);

        assert_eq!(sched.gc(), 1);
        assert!(sched.thread(finished).is_none());
        assert_eq!(sched.thread(looping).unwrap().state, ThreadState::Ready);
        assert_eq!(sched.thread_count(), 2);

        done.set(true);
        sched.join();
        assert_eq!(sched.gc(), 1);
        assert_eq!(ring_ids(&sched), vec![BOOTSTRAP_THREAD_ID]);
    }

    #[test]
    fn test_thread_stats() {
        let sched = scheduler();

        let s = sched.clone();
        let id = sched.spawn(move || {
            for _ in 0..2 {
                let _ = s.yield_now(NO_CONDITION);
            }
        });
        sched.join();

        let stats = sched.thread(id).unwrap().stats;
        assert_eq!(stats.schedule_count, 3);
        assert_eq!(stats.voluntary_switches, 3);

        let boot = sched.thread(BOOTSTRAP_THREAD_ID).unwrap().stats;
        assert_eq!(boot.schedule_count, 3);
        assert_eq!(boot.voluntary_switches, 3);
    }

    #[test]
    fn test_spawn_from_green_thread() {
        let sched = scheduler();
        let log = new_log();
        let inner_id = Rc::new(Cell::new(0));

        let (s, l, i) = (sched.clone(), log.clone(), inner_id.clone());
        let outer = sched.spawn(move || {
            l.borrow_mut().push("outer");
            let l2 = l.clone();
            i.set(s.spawn(move || l2.borrow_mut().push("inner")));
            l.borrow_mut().push("outer done");
        });

        // The outer thread is parked inside its own spawn
        assert_eq!(*log.borrow(), vec!["outer", "inner"]);
        assert_eq!(sched.thread(outer).unwrap().state, ThreadState::Ready);

        sched.join();
        assert_eq!(*log.borrow(), vec!["outer", "inner", "outer done"]);
        assert_eq!(inner_id.get(), 2);
        assert_eq!(sched.gc(), 2);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let sched = scheduler();
        let a = sched.spawn(|| {});
        assert_eq!(sched.gc(), 1);
        let b = sched.spawn(|| {});
        assert!(b > a);
    }
}
