// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Process-wide scheduler
//!
//! One scheduler can be installed per OS thread. The free functions here
//! forward to it, so callers never have to pass a handle around.

use core::cell::RefCell;
use std::rc::Rc;

use super::scheduler::Scheduler;
use super::state::Condition;
use super::thread::{ThreadId, BOOTSTRAP_THREAD_ID};
use crate::config::Config;
use crate::error::SchedError;

thread_local! {
    static SCHEDULER: RefCell<Option<Rc<Scheduler>>> = const { RefCell::new(None) };
}

/// Handle to the installed scheduler
///
/// The slot is only borrowed long enough to clone the handle; no borrow is
/// held while a scheduling call switches threads.
fn installed() -> Result<Rc<Scheduler>, SchedError> {
    SCHEDULER.with(|slot| slot.borrow().clone().ok_or(SchedError::NotInitialized))
}

/// Run `f` against the installed scheduler without holding a handle
///
/// A thread may be suspended inside `f` when the bootstrap thread calls
/// `shutdown`. A handle held on its stack would keep the scheduler and
/// every stack alive forever.
fn with_installed<R>(f: impl FnOnce(&Scheduler) -> R) -> Result<R, SchedError> {
    let raw = Rc::as_ptr(&installed()?);

    // Safety: the slot keeps the scheduler alive until `shutdown`, which
    // only runs on the bootstrap thread outside any scheduling call. A
    // suspended green thread is never resumed after that.
    Ok(f(unsafe { &*raw }))
}

/// Install a scheduler with the default configuration
pub fn init() -> Result<(), SchedError> {
    init_with(Config::default())
}

/// Install a scheduler; the caller becomes the bootstrap thread
pub fn init_with(config: Config) -> Result<(), SchedError> {
    SCHEDULER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(SchedError::AlreadyInitialized);
        }
        *slot = Some(Scheduler::new(config));
        Ok(())
    })
}

/// Spawn a thread on the installed scheduler
pub fn spawn<F>(body: F) -> Result<ThreadId, SchedError>
where
    F: FnOnce() + 'static,
{
    with_installed(|scheduler| scheduler.spawn(body))
}

/// Give up the CPU, optionally signaling `condition`
pub fn yield_now(condition: Condition) -> Result<(), SchedError> {
    with_installed(|scheduler| scheduler.yield_now(condition))?
}

/// Give up the CPU while waiting on `condition`
pub fn wait(condition: Condition) -> Result<(), SchedError> {
    with_installed(|scheduler| scheduler.wait(condition))?
}

/// Run other threads until none is READY any more
pub fn join() -> Result<(), SchedError> {
    with_installed(Scheduler::join)
}

/// Terminate the calling thread
///
/// Without an installed scheduler the caller is the only thread, so the
/// process exits.
pub fn exit() -> ! {
    let raw = match installed() {
        Ok(scheduler) => Rc::as_ptr(&scheduler),
        Err(_) => std::process::exit(0),
    };

    // Safety: as in `with_installed`. The handle is released before the
    // call, which never returns.
    unsafe { (*raw).exit() }
}

/// Reclaim exited threads
pub fn gc() -> Result<usize, SchedError> {
    with_installed(Scheduler::gc)
}

/// ID of the running thread, or `None` before `init`
pub fn current() -> Option<ThreadId> {
    installed().ok().map(|scheduler| scheduler.current())
}

/// Uninstall the scheduler
///
/// Only the bootstrap thread may do this. Threads that never finished are
/// released with the scheduler without running any further.
pub fn shutdown() -> Result<(), SchedError> {
    let scheduler = installed()?;
    if scheduler.current() != BOOTSTRAP_THREAD_ID {
        return Err(SchedError::NotBootstrap);
    }
    drop(scheduler);

    let taken = SCHEDULER.with(|slot| slot.borrow_mut().take());
    if let Some(scheduler) = taken {
        log::debug!(
            "scheduler uninstalled ({} threads left)",
            scheduler.thread_count()
        );
    }
    Ok(())
}
