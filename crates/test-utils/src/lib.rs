pub mod builders;
pub mod fake_executor;
pub mod flaky_store;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use bashq::store::CommandStore;
use bashq::types::{Command, CommandId};
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Output is captured by the harness and only shown for failing tests.
/// `RUST_LOG` selects the filter and defaults to `info`, so
/// `RUST_LOG=bashq=debug cargo test` shows engine decisions.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Fail the test if `f` takes longer than five seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Poll the store until `pred` holds for command `id`, then return the row.
///
/// Panics after `deadline` with the last observed row.
pub async fn wait_for_command<S, P>(
    store: &S,
    id: CommandId,
    deadline: Duration,
    pred: P,
) -> Command
where
    S: CommandStore + ?Sized,
    P: Fn(&Command) -> bool,
{
    let start = tokio::time::Instant::now();
    loop {
        let command = store
            .get_command(id)
            .await
            .expect("command should exist while waiting on it");
        if pred(&command) {
            return command;
        }
        if start.elapsed() >= deadline {
            panic!("condition not reached within {deadline:?}; last row: {command:?}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
