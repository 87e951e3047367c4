//! Whole-crate test suites that exercise several modules together: property
//! tests over structural invariants, and end-to-end scenarios against the
//! public `Table`/`LazyFrame` surface.

mod property_tests;

use std::sync::Once;

static LOG_INIT: Once = Once::new();

/// Initialize `env_logger` once per test process, so the `log::debug!`/
/// `trace!` call sites in `group/strategy.rs`, `jit.rs` and `join.rs` are
/// observable when running tests with `RUST_LOG` set (e.g.
/// `RUST_LOG=debug cargo test -- --nocapture`). Safe to call from more than
/// one test, including concurrently — `Once` guarantees `env_logger::init`
/// runs at most once.
pub(crate) fn init_logging() {
    LOG_INIT.call_once(|| env_logger::init());
}
