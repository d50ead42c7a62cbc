// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! ARM64 Execution Context
//!
//! AAPCS64 callee-saved state: x19-x28, the frame pointer (x29), the link
//! register (x30), sp and the low halves of v8-v15.

mod switch;

pub use switch::switch_context;
use switch::trampoline_entry;

use super::{EntryPoint, STACK_ALIGN};

/// Saved CPU registers
///
/// Field offsets are part of the contract with `switch_context`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    /// x19-x28 (offsets 0x00..0x50)
    pub x: [u64; 10],
    /// Frame pointer x29 (offset 0x50)
    pub fp: u64,
    /// Link register x30 (offset 0x58)
    pub lr: u64,
    /// Stack pointer (offset 0x60)
    pub sp: u64,
    /// d8-d15 (offsets 0x68..0xA8)
    pub d: [u64; 8],
}

impl Context {
    /// Prime a context so the first switch into it calls `entry(arg)` on
    /// the stack ending at `stack_top`
    ///
    /// Nothing is written to the stack: `lr` points at the entry stub,
    /// `x19` carries `entry` and `x20` carries `arg`.
    ///
    /// # Safety
    ///
    /// `stack_top` must be the one-past-the-end address of a writable stack
    /// that nothing else uses.
    pub unsafe fn prime(stack_top: *mut u8, entry: EntryPoint, arg: usize) -> Self {
        let top = (stack_top as usize) & !(STACK_ALIGN - 1);

        let mut ctx = Self::default();
        ctx.x[0] = entry as usize as u64;
        ctx.x[1] = arg as u64;
        ctx.lr = trampoline_entry as usize as u64;
        ctx.sp = top as u64;
        ctx
    }
}
