// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Scheduler configuration
//!
//! A [`Config`] is fixed for the lifetime of a scheduler. Every spawned
//! thread gets a stack of the same size and with the same flags.

use crate::arch::STACK_ALIGN;
use crate::mm::StackFlags;

/// Default stack size for spawned threads (128 KiB)
pub const DEFAULT_STACK_SIZE: usize = 128 * 1024;

/// Smallest stack a thread may be given (16 KiB)
pub const MIN_STACK_SIZE: usize = 16 * 1024;

/// Scheduler configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Requested stack size in bytes
    pub stack_size: usize,
    /// Allocation and checking options for thread stacks
    pub stack_flags: StackFlags,
}

impl Config {
    /// Create a configuration with default settings
    pub const fn new() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            stack_flags: StackFlags::CANARY,
        }
    }

    /// Set the stack size for spawned threads
    pub const fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    /// Set the stack flags for spawned threads
    pub const fn with_stack_flags(mut self, flags: StackFlags) -> Self {
        self.stack_flags = flags;
        self
    }

    /// Stack size actually allocated: at least [`MIN_STACK_SIZE`],
    /// rounded up to the stack alignment
    pub const fn effective_stack_size(&self) -> usize {
        let size = if self.stack_size < MIN_STACK_SIZE {
            MIN_STACK_SIZE
        } else {
            self.stack_size
        };
        (size + STACK_ALIGN - 1) & !(STACK_ALIGN - 1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
