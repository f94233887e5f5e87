// src/exec/process.rs

//! Body of one command execution: spawn, record pid, stream, wait, finish.

use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::exec::buffer::{spawn_pump, OutputBuffer};
use crate::exec::streamer::stream_output;
use crate::exec::ExecContext;
use crate::types::{CommandId, CommandStatus};

/// Run `script` for `command_id` to completion.
///
/// Never returns an error: every outcome is written to the store. The
/// sequence is strictly spawn, pid, streamer start, wait, streamer stop,
/// terminal write, streamer join. Completion is published last so waiting
/// promoters only wake once the row is final.
pub async fn run_command(ctx: &ExecContext, command_id: CommandId, script: String) {
    let buffer = OutputBuffer::new(ctx.settings.max_output_bytes);

    info!(command_id, shell = %ctx.settings.shell, "starting command process");

    let mut cmd = Command::new(&ctx.settings.shell);
    cmd.arg("-c")
        .arg(&script)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(command_id, error = %err, "failed to spawn command process");
            write_terminal(ctx, command_id, CommandStatus::Error, &buffer).await;
            ctx.completions.publish(command_id);
            return;
        }
    };

    match child.id() {
        Some(pid) => {
            if let Err(err) = ctx.store.update_pid(command_id, pid).await {
                error!(command_id, pid, error = %err, "failed to record pid; process keeps running");
            } else {
                debug!(command_id, pid, "recorded command pid");
            }
        }
        None => warn!(command_id, "spawned process has no pid"),
    }

    let mut pumps = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        pumps.push(spawn_pump(command_id, "stdout", stdout, buffer.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        pumps.push(spawn_pump(command_id, "stderr", stderr, buffer.clone()));
    }

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let streamer = tokio::spawn(stream_output(
        Arc::clone(&ctx.store),
        command_id,
        buffer.clone(),
        ctx.settings.output_flush_interval,
        stop_rx,
    ));

    let wait_result = child.wait().await;

    // The pipes close when the process exits; draining them first makes the
    // terminal write complete.
    for pump in pumps {
        if let Err(err) = pump.await {
            warn!(command_id, error = %err, "output reader task failed");
        }
    }

    let _ = stop_tx.send(());

    let terminal = match wait_result {
        Ok(status) if status.success() => {
            info!(command_id, "command completed");
            CommandStatus::Completed
        }
        Ok(status) => {
            info!(command_id, exit_code = ?status.code(), "command exited with failure");
            CommandStatus::Error
        }
        Err(err) => {
            error!(command_id, error = %err, "failed waiting for command process");
            CommandStatus::Error
        }
    };

    write_terminal(ctx, command_id, terminal, &buffer).await;

    if let Err(err) = streamer.await {
        warn!(command_id, error = %err, "output streamer task failed");
    }

    ctx.completions.publish(command_id);
}

async fn write_terminal(
    ctx: &ExecContext,
    command_id: CommandId,
    status: CommandStatus,
    buffer: &OutputBuffer,
) {
    if let Err(err) = ctx
        .store
        .update_status(command_id, status, Some(buffer.snapshot()))
        .await
    {
        error!(command_id, status = %status, error = %err, "failed to record terminal status");
    }
}
