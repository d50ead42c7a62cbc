// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler and thread management
//!
//! This module provides the thread control block, the scheduling ring and
//! the cooperative scheduler built on top of them.
//!
//! # Example
//! ```ignore
//! use greenux::sched::Scheduler;
//! use greenux::Config;
//!
//! let sched = Scheduler::new(Config::default());
//! let s = sched.clone();
//! sched.spawn(move || {
//!     s.wait(1).ok();
//! });
//! sched.yield_now(1).ok();
//! sched.join();
//! ```

pub mod global;
pub mod ring;
pub mod scheduler;
pub mod state;
pub mod thread;

mod trampoline;

pub use ring::Ring;
pub use scheduler::Scheduler;
pub use state::{Condition, ThreadState, NO_CONDITION};
pub use thread::{Thread, ThreadId, ThreadInfo, ThreadStats, BOOTSTRAP_THREAD_ID};
