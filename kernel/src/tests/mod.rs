/*
 * Kernel Self-Test Harness
 *
 * Runtime checks invoked from `kstart`, in the style of a `no_std`/
 * `no_main` binary with no libtest: each test is a plain function that
 * logs PASS/FAIL via `log::*` and returns a bool, rather than a `#[test]`
 * a test runner could collect. Pure, self-contained logic (the heap math,
 * `change_sched`'s argument validation) gets ordinary `#[cfg(test)] mod
 * tests` blocks instead, next to the code they cover.
 */

pub mod scheduler_tests;

/// Run every scheduler self-check and log a final summary. Safe to call
/// once early in `kstart`, before any demo process has been spawned —
/// every test allocates and tears down its own process-table slots.
pub fn run_all() {
    log::info!("Running scheduler self-tests...");
    let results = scheduler_tests::run_all();
    let passed = results.iter().filter(|&&ok| ok).count();
    let total = results.len();
    if passed == total {
        log::info!("Scheduler self-tests: {}/{} passed", passed, total);
    } else {
        log::error!("Scheduler self-tests: {}/{} passed", passed, total);
    }
}
