// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread stacks
//!
//! A [`Stack`] is a fixed-size heap block owned by exactly one thread. It
//! is never shared or resized and is released exactly once, when the owning
//! thread control block is dropped.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use crate::arch::STACK_ALIGN;

/// Pattern written at the low end of a stack when [`StackFlags::CANARY`] is set
pub const STACK_CANARY: u64 = 0x5AFE_57AC_C0DE_F00D;

/// Number of canary words at the bottom of the stack
const CANARY_WORDS: usize = 4;

bitflags::bitflags! {
    /// Stack allocation options
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StackFlags: u32 {
        /// Zero-fill the stack at allocation
        const ZEROED = 1 << 0;
        /// Write a canary at the stack limit and verify it on release
        const CANARY = 1 << 1;
    }
}

/// Owned thread stack (grows down from [`Stack::top`])
#[derive(Debug)]
pub struct Stack {
    base: NonNull<u8>,
    layout: Layout,
    flags: StackFlags,
}

impl Stack {
    /// Allocate a stack of `size` bytes
    ///
    /// Allocation failure is fatal and aborts the process through
    /// [`alloc::handle_alloc_error`].
    ///
    /// # Panics
    ///
    /// Panics if `size` is too small to hold the canary or overflows a
    /// [`Layout`].
    pub fn new(size: usize, flags: StackFlags) -> Self {
        assert!(
            size >= CANARY_WORDS * core::mem::size_of::<u64>() + STACK_ALIGN,
            "stack of {} bytes is too small",
            size
        );
        let layout = match Layout::from_size_align(size, STACK_ALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("invalid stack size {}", size),
        };

        let ptr = unsafe {
            if flags.contains(StackFlags::ZEROED) {
                alloc::alloc_zeroed(layout)
            } else {
                alloc::alloc(layout)
            }
        };
        let base = match NonNull::new(ptr) {
            Some(base) => base,
            None => alloc::handle_alloc_error(layout),
        };

        let stack = Self { base, layout, flags };
        if flags.contains(StackFlags::CANARY) {
            stack.write_canary();
        }
        stack
    }

    /// Lowest address of the stack
    pub fn base(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    /// One past the highest address; the initial stack pointer
    pub fn top(&self) -> *mut u8 {
        unsafe { self.base.as_ptr().add(self.layout.size()) }
    }

    /// Size of the stack in bytes
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Allocation flags
    pub fn flags(&self) -> StackFlags {
        self.flags
    }

    /// Check that the canary at the stack limit is untouched
    ///
    /// Always true for stacks allocated without [`StackFlags::CANARY`].
    pub fn canary_intact(&self) -> bool {
        if !self.flags.contains(StackFlags::CANARY) {
            return true;
        }
        let words = self.base.as_ptr() as *const u64;
        (0..CANARY_WORDS).all(|i| unsafe { words.add(i).read() } == STACK_CANARY)
    }

    fn write_canary(&self) {
        let words = self.base.as_ptr() as *mut u64;
        for i in 0..CANARY_WORDS {
            unsafe { words.add(i).write(STACK_CANARY) };
        }
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        if !self.canary_intact() {
            log::error!(
                "stack at {:p} ({} bytes) overflowed its canary",
                self.base.as_ptr(),
                self.layout.size()
            );
        }
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) };
    }
}
