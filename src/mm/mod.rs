// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Memory management
//!
//! Green threads need exactly one kind of memory: a private call stack
//! per thread, allocated at spawn and released at reclamation.

pub mod stack;

pub use stack::{Stack, StackFlags, STACK_CANARY};
