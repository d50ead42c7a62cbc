// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! # Greenux - Cooperative Green Threads
//!
//! Greenux multiplexes many logical threads onto a single OS thread by
//! saving and restoring register contexts in user space. Nothing is
//! preempted: a thread only gives up the CPU at `yield_now`, `wait` or
//! `exit`.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── arch/              # Context switch primitive (x86_64, aarch64)
//! ├── mm/                # Owned thread stacks
//! ├── sched/             # Thread control blocks, ring, scheduling policy
//! ├── config.rs          # Scheduler configuration
//! ├── error.rs           # SchedError
//! ├── logging.rs         # Optional stderr logger for the `log` facade
//! └── lib.rs             # This file
//! ```
//!
//! ## Two ways in
//!
//! The [`Scheduler`] object can be created and driven explicitly, which
//! keeps independent instances isolated from each other:
//!
//! ```ignore
//! use greenux::{Config, Scheduler};
//!
//! let sched = Scheduler::new(Config::default());
//! let handle = sched.clone();
//! sched.spawn(move || {
//!     handle.yield_now(0).ok();
//! });
//! sched.join();
//! sched.gc();
//! ```
//!
//! The free functions install one scheduler per OS thread and mirror the
//! classic C-style API:
//!
//! ```ignore
//! greenux::init()?;
//! greenux::spawn(|| {
//!     greenux::wait(5).ok();
//! })?;
//! greenux::yield_now(5)?;
//! greenux::join()?;
//! greenux::gc()?;
//! ```

// Architecture-specific context switching
pub mod arch;

// Stack memory
pub mod mm;

// Scheduler and thread management
pub mod sched;

// Configuration
pub mod config;

// Error type
pub mod error;

// Logging backend
pub mod logging;

// Re-export commonly used types
pub use config::{Config, DEFAULT_STACK_SIZE, MIN_STACK_SIZE};
pub use error::SchedError;
pub use mm::{Stack, StackFlags};
pub use sched::global::{
    current, exit, gc, init, init_with, join, shutdown, spawn, wait, yield_now,
};
pub use sched::{
    Condition, Scheduler, ThreadId, ThreadInfo, ThreadState, ThreadStats, BOOTSTRAP_THREAD_ID,
    NO_CONDITION,
};
