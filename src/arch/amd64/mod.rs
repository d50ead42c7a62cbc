// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! x86-64 Execution Context
//!
//! Saved state follows the System V AMD64 ABI: only the callee-saved
//! registers, the stack pointer and the floating point control words
//! need to survive a call to [`switch_context`].

mod switch;

pub use switch::switch_context;
use switch::trampoline_entry;

use x86_64::VirtAddr;

use super::{EntryPoint, STACK_ALIGN};

/// Default MXCSR value: all SSE exceptions masked, round to nearest
pub const DEFAULT_MXCSR: u32 = 0x1F80;

/// Default x87 control word: all exceptions masked, 64-bit precision
pub const DEFAULT_FPU_CW: u16 = 0x037F;

/// Saved CPU registers
///
/// Field offsets are part of the contract with `switch_context` and must
/// not be reordered.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Stack pointer (offset 0x00)
    pub rsp: u64,
    /// Frame pointer (offset 0x08)
    pub rbp: u64,
    /// Callee-saved general purpose registers (offsets 0x10..0x38)
    pub rbx: u64,
    pub r12: u64,
    pub r13: u64,
    pub r14: u64,
    pub r15: u64,
    /// SSE control/status (offset 0x38)
    pub mxcsr: u32,
    /// x87 control word (offset 0x3C)
    pub fpu_cw: u16,
    _pad: u16,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            rsp: 0,
            rbp: 0,
            rbx: 0,
            r12: 0,
            r13: 0,
            r14: 0,
            r15: 0,
            mxcsr: DEFAULT_MXCSR,
            fpu_cw: DEFAULT_FPU_CW,
            _pad: 0,
        }
    }
}

impl Context {
    /// Prime a context so the first switch into it calls `entry(arg)` on
    /// the stack ending at `stack_top`
    ///
    /// Stack layout (grows down):
    ///
    /// ```text
    /// top (aligned to 16) ->
    ///   [top - 8]   0                 terminates frame-pointer walks
    ///   [top - 16]  trampoline_entry  popped by `ret` in switch_context
    ///               <- rsp
    /// ```
    ///
    /// `r12` carries `entry` and `r13` carries `arg` into the entry stub.
    ///
    /// # Safety
    ///
    /// `stack_top` must be the one-past-the-end address of a writable stack
    /// of at least a few hundred bytes that nothing else uses.
    pub unsafe fn prime(stack_top: *mut u8, entry: EntryPoint, arg: usize) -> Self {
        let top = VirtAddr::from_ptr(stack_top as *const u8).align_down(STACK_ALIGN as u64);
        let frame = top - 2 * core::mem::size_of::<u64>() as u64;

        let slots = frame.as_mut_ptr::<u64>();
        slots.write(trampoline_entry as usize as u64);
        slots.add(1).write(0);

        Self {
            rsp: frame.as_u64(),
            r12: entry as usize as u64,
            r13: arg as u64,
            ..Self::default()
        }
    }
}
