//! Thin wrappers over the process environment.
//!
//! The shell evaluates on a single thread; spawned children pick up mutations
//! through normal exec inheritance. That makes the process-global environment
//! the right store here, as opposed to a shell-private variable map.

use std::env as stdenv;

/// Get the value of an environment variable, `None` when unset.
pub fn lookup(name: &str) -> Option<String> {
    stdenv::var(name).ok()
}

/// Set or override an environment variable.
pub fn assign(name: &str, value: &str) {
    // Sound because the shell mutates its environment only from the
    // evaluation thread. Tests that reach this function serialize behind
    // `crate::test_lock`, which keeps the single-threaded assumption true
    // under the multithreaded test harness as well.
    unsafe {
        stdenv::set_var(name, value);
    }
}
