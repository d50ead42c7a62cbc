// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! x86-64 Context Switch
//!
//! Both routines are naked: the compiler emits no prologue, so the stack
//! pointer seen here is exactly the caller's.

use core::arch::naked_asm;

use super::Context;

/// Save the running thread into `from` and resume `to`
///
/// Returns when some other thread switches back into `from`.
///
/// # Arguments
///
/// * `from` - Context that receives the current callee-saved state (rdi)
/// * `to` - Context to resume (rsi)
///
/// # Safety
///
/// `to` must hold either state saved by a previous call to this function
/// or a context produced by [`Context::prime`], and its stack must still be
/// alive. `from` must stay valid until the thread is resumed.
#[unsafe(naked)]
pub unsafe extern "C" fn switch_context(_from: *mut Context, _to: *const Context) {
    naked_asm!(
        // Save callee-saved registers into `from`
        "mov [rdi + 0x00], rsp",
        "mov [rdi + 0x08], rbp",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], r12",
        "mov [rdi + 0x20], r13",
        "mov [rdi + 0x28], r14",
        "mov [rdi + 0x30], r15",
        "stmxcsr dword ptr [rdi + 0x38]",
        "fnstcw word ptr [rdi + 0x3c]",
        // Load callee-saved registers from `to`
        "mov rsp, [rsi + 0x00]",
        "mov rbp, [rsi + 0x08]",
        "mov rbx, [rsi + 0x10]",
        "mov r12, [rsi + 0x18]",
        "mov r13, [rsi + 0x20]",
        "mov r14, [rsi + 0x28]",
        "mov r15, [rsi + 0x30]",
        "ldmxcsr dword ptr [rsi + 0x38]",
        "fldcw word ptr [rsi + 0x3c]",
        // Resumed thread: back into its switch_context caller.
        // Primed thread: pops trampoline_entry.
        "ret",
    );
}

/// First code a primed thread runs
///
/// Entered by `ret` with rsp 8 bytes past a 16-byte boundary. Realigns the
/// stack, clears the frame pointer, then calls `entry(arg)` from r12/r13.
#[unsafe(naked)]
pub(super) unsafe extern "C" fn trampoline_entry() -> ! {
    naked_asm!(
        "mov rdi, r13",
        "and rsp, -16",
        "xor ebp, ebp",
        "call r12",
        "ud2",
    );
}
