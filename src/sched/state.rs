// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread state
//!
//! ```text
//! Init -> Ready <-> Running -> Zombie -> (reclaimed)
//! ```
//!
//! `Init` only exists between allocation and priming. Exactly one thread
//! is `Running` at any time.

/// Condition identifier; 0 means "no condition"
pub type Condition = u64;

/// The "no condition" value passed to `yield_now` for a plain yield
pub const NO_CONDITION: Condition = 0;

/// Thread states
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadState {
    /// Allocated but not yet primed
    Init,
    /// Thread is ready to run
    Ready,
    /// Thread is currently running
    Running,
    /// Thread has exited and waits for reclamation
    Zombie,
}

impl ThreadState {
    /// Check if the scheduler may pick this thread
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Check if the thread has exited
    pub const fn is_zombie(&self) -> bool {
        matches!(self, Self::Zombie)
    }
}
