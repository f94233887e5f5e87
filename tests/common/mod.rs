#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bashq::config::ServiceSettings;
use bashq::engine::{CommandService, CompletionBus};
use bashq::store::{CommandStore, MemoryStore};
use bashq::types::CommandId;

pub use bashq_test_utils::builders::{ConfigFileBuilder, SettingsBuilder};
pub use bashq_test_utils::fake_executor::RecordingExecutor;
pub use bashq_test_utils::flaky_store::FlakyStore;
pub use bashq_test_utils::{init_tracing, wait_for_command, with_timeout};

/// A service whose executor only records launches.
pub struct FakeHarness {
    pub store: Arc<dyn CommandStore>,
    pub executor: RecordingExecutor,
    pub service: CommandService,
}

pub fn fake_harness(settings: ServiceSettings) -> FakeHarness {
    fake_harness_with_store(Arc::new(MemoryStore::new()), settings)
}

pub fn fake_harness_with_store(store: Arc<dyn CommandStore>, settings: ServiceSettings) -> FakeHarness {
    let completions = CompletionBus::new();
    let executor = RecordingExecutor::new(Arc::clone(&store), completions.clone());
    let service = CommandService::new(
        Arc::clone(&store),
        Arc::new(executor.clone()),
        completions,
        settings,
    );
    FakeHarness {
        store,
        executor,
        service,
    }
}

/// A service that runs scripts through `sh`.
pub fn shell_service(settings: ServiceSettings) -> (Arc<dyn CommandStore>, CommandService) {
    let store: Arc<dyn CommandStore> = Arc::new(MemoryStore::new());
    let service = CommandService::with_shell_executor(Arc::clone(&store), settings);
    (store, service)
}

/// Wait until the fake executor has launched `id`.
pub async fn wait_for_launch(executor: &RecordingExecutor, id: CommandId, deadline: Duration) {
    let start = tokio::time::Instant::now();
    while !executor.launched_ids().contains(&id) {
        if start.elapsed() >= deadline {
            panic!(
                "command {id} not launched within {deadline:?}; launched: {:?}",
                executor.launched_ids()
            );
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
