//! Test-only fault hooks for chunk workers.
//!
//! Chunk functions pass each wordlist entry or username through [`inject`].
//! The reserved keys below make the calling chunk panic or stall, which lets
//! tests reach the failure and timeout paths of both phases.

use std::time::Duration;

/// Makes the chunk holding this key panic with a `String` payload.
pub const PANIC: &str = "\u{0}panic";

/// Makes the chunk holding this key block for [`STALL_FOR`].
pub const STALL: &str = "\u{0}stall";

pub const STALL_FOR: Duration = Duration::from_millis(500);

pub fn inject(key: &str) {
    if key == PANIC {
        panic!("injected chunk failure at {:?}", key);
    }
    if key == STALL {
        std::thread::sleep(STALL_FOR);
    }
}

/// Panic message produced for [`PANIC`].
pub fn panic_reason() -> String {
    format!("injected chunk failure at {:?}", PANIC)
}
