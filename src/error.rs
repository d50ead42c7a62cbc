// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler errors
//!
//! Only recoverable conditions are represented here. Resource exhaustion
//! and corrupted state abort the process instead.

use core::fmt;

/// Errors returned by scheduling operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// No other thread is READY, so control could not be handed off
    NoReadyThread,
    /// `wait` was called with condition 0
    InvalidCondition,
    /// The process-wide scheduler has not been installed on this OS thread
    NotInitialized,
    /// The process-wide scheduler is already installed on this OS thread
    AlreadyInitialized,
    /// The operation is only valid on the bootstrap thread
    NotBootstrap,
}

impl SchedError {
    /// Short description, in the same words `Display` uses
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoReadyThread => "no other thread is ready to run",
            Self::InvalidCondition => "condition 0 cannot be waited on",
            Self::NotInitialized => "scheduler not initialized",
            Self::AlreadyInitialized => "scheduler already initialized",
            Self::NotBootstrap => "operation requires the bootstrap thread",
        }
    }
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for SchedError {}
