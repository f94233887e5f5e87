// tests/store_behaviour.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;

use bashq::errors::BashqError;
use bashq::store::{Admission, CommandStore, MemoryStore, Promotion};
use bashq::types::CommandStatus;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn terminal_rows_ignore_late_writes() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    let id = store
        .insert_command("sleep 1".to_string(), CommandStatus::Running)
        .await?;

    store
        .update_status(id, CommandStatus::Stopped, None)
        .await?;
    store
        .update_status(id, CommandStatus::Error, Some("late".to_string()))
        .await?;
    store.update_output(id, "later".to_string()).await?;

    let row = store.get_command(id).await?;
    assert_eq!(row.status, CommandStatus::Stopped);
    assert_eq!(row.output, "");
    Ok(())
}

#[tokio::test]
async fn pid_is_recorded_once_and_only_while_running() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    let waiting = store.insert_queued_command("echo".to_string()).await?;
    store.update_pid(waiting, 100).await?;
    assert_eq!(store.get_command(waiting).await?.pid, None);

    let running = store
        .insert_command("echo".to_string(), CommandStatus::Running)
        .await?;
    store.update_pid(running, 200).await?;
    store.update_pid(running, 300).await?;
    assert_eq!(store.get_command(running).await?.pid, Some(200));
    Ok(())
}

#[tokio::test]
async fn admit_or_enqueue_respects_ceiling() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();

    let a = store.admit_or_enqueue("a".to_string(), 1).await?;
    let b = store.admit_or_enqueue("b".to_string(), 1).await?;

    assert_eq!(a, Admission::Admitted(1));
    assert_eq!(b, Admission::Queued(2));
    assert_eq!(store.count_running().await?, 1);

    let queue = store.list_queue().await?;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].command_id, b.command_id());
    Ok(())
}

#[tokio::test]
async fn promote_if_capacity_outcomes() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    let running = store
        .insert_command("a".to_string(), CommandStatus::Running)
        .await?;
    let queued = store.insert_queued_command("b".to_string()).await?;

    assert_eq!(
        store.promote_if_capacity(queued, 1).await?,
        Promotion::NoCapacity
    );
    assert_eq!(
        store.promote_if_capacity(running, 1).await?,
        Promotion::NotQueued(CommandStatus::Running)
    );

    store
        .update_status(running, CommandStatus::Completed, None)
        .await?;
    assert_eq!(
        store.promote_if_capacity(queued, 1).await?,
        Promotion::Promoted {
            script: "b".to_string()
        }
    );
    assert!(store.list_queue().await?.is_empty());
    assert_eq!(
        store.get_command(queued).await?.status,
        CommandStatus::Running
    );

    assert!(matches!(
        store.promote_if_capacity(404, 1).await,
        Err(BashqError::NotFound(404))
    ));
    Ok(())
}

#[tokio::test]
async fn force_promote_ignores_ceiling_but_not_status() -> TestResult {
    init_tracing();
    let store = MemoryStore::new();
    store
        .insert_command("a".to_string(), CommandStatus::Running)
        .await?;
    let queued = store.insert_queued_command("b".to_string()).await?;

    assert!(matches!(
        store.force_promote(queued).await?,
        Promotion::Promoted { .. }
    ));
    assert_eq!(store.count_running().await?, 2);
    assert_eq!(
        store.force_promote(queued).await?,
        Promotion::NotQueued(CommandStatus::Running)
    );
    Ok(())
}

#[tokio::test]
async fn snapshot_survives_reopen() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("nested").join("commands.json");

    {
        let store = MemoryStore::open(&path)?;
        let done = store
            .insert_command("echo done".to_string(), CommandStatus::Running)
            .await?;
        store
            .update_status(done, CommandStatus::Completed, Some("done\n".to_string()))
            .await?;
        store.insert_queued_command("echo later".to_string()).await?;
    }
    assert!(path.is_file());

    let reopened = MemoryStore::open(&path)?;
    let commands = reopened.list_commands().await?;
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].status, CommandStatus::Completed);
    assert_eq!(commands[0].output, "done\n");
    assert_eq!(commands[1].status, CommandStatus::Waiting);

    let queue = reopened.list_queue().await?;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].command_id, 2);

    // Ids keep counting from where the previous process stopped.
    let next = reopened
        .insert_command("echo next".to_string(), CommandStatus::Running)
        .await?;
    assert_eq!(next, 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn snapshot_writes_coalesce_to_latest_state() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("commands.json");

    let store = MemoryStore::open(&path)?;
    let id = store
        .insert_command("yes".to_string(), CommandStatus::Running)
        .await?;
    let mut output = String::new();
    for i in 0..500 {
        output.push_str(&format!("{i}\n"));
        store.update_output(id, output.clone()).await?;
    }
    store
        .update_status(id, CommandStatus::Completed, None)
        .await?;
    store.flush();

    // The writer owns the file; read it while the store is still open.
    let on_disk = MemoryStore::open(&path)?;
    let row = on_disk.get_command(id).await?;
    assert_eq!(row.status, CommandStatus::Completed);
    assert_eq!(row.output, output);
    Ok(())
}

#[tokio::test]
async fn empty_snapshot_file_opens_as_empty_store() -> TestResult {
    init_tracing();
    let file = tempfile::NamedTempFile::new()?;
    let store = MemoryStore::open(file.path())?;
    assert!(store.list_commands().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn corrupt_snapshot_is_an_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("commands.json");
    std::fs::write(&path, "{ not json")?;

    assert!(matches!(
        MemoryStore::open(&path),
        Err(BashqError::JsonError(_))
    ));
    Ok(())
}
