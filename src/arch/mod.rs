// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Architecture-specific context switching
//!
//! Each architecture provides the same narrow interface:
//!
//! - [`Context`]: the callee-saved register snapshot of a suspended thread
//! - [`Context::prime`]: lay out a fresh stack so the first switch into it
//!   calls an [`EntryPoint`]
//! - [`switch_context`]: save the running state into one context and
//!   resume another
//!
//! Everything above this module treats a `Context` as opaque.

#[cfg(target_arch = "x86_64")]
pub mod amd64;

#[cfg(target_arch = "aarch64")]
pub mod arm64;

#[cfg(target_arch = "x86_64")]
pub use amd64::{switch_context, Context};

#[cfg(target_arch = "aarch64")]
pub use arm64::{switch_context, Context};

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("greenux only supports x86_64 and aarch64");

/// Function a primed context starts executing on its new stack
///
/// The argument is whatever was passed to [`Context::prime`]. The function
/// must never return: there is no frame to return into.
pub type EntryPoint = extern "C" fn(usize) -> !;

/// Required alignment of the stack pointer at a call boundary
pub const STACK_ALIGN: usize = 16;
