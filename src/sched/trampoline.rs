// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread trampoline
//!
//! Every spawned thread starts here, on its own stack, the first time the
//! scheduler switches into it. The body runs to completion and the thread
//! then exits exactly as if the body had called `exit` itself.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use super::scheduler::Scheduler;

/// Entry point handed to `Context::prime`
///
/// `arg` is the address of the scheduler that spawned the thread.
pub(super) extern "C" fn thread_main(arg: usize) -> ! {
    // Safety: `Scheduler::spawn` primes threads with the address of the
    // scheduler that owns them, and a scheduler outlives its threads.
    let scheduler = unsafe { &*(arg as *const Scheduler) };

    if let Some(body) = scheduler.take_current_body() {
        // There is no frame above this one to unwind into
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(body)) {
            log::error!(
                "green thread {} panicked: {}",
                scheduler.current(),
                panic_message(payload.as_ref())
            );
            std::process::abort();
        }
    }

    scheduler.exit()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}
