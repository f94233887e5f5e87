// src/exec/signal.rs

use std::io;

/// Deliver `SIGINT` to the process group led by `pid`, falling back to the
/// single process when no such group exists.
#[cfg(unix)]
pub fn interrupt(pid: u32) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .ok()
        .filter(|pid| *pid > 0)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("invalid pid {pid}")))?;

    if unsafe { libc::kill(-pid, libc::SIGINT) } == 0 {
        return Ok(());
    }
    let group_err = io::Error::last_os_error();
    if unsafe { libc::kill(pid, libc::SIGINT) } == 0 {
        return Ok(());
    }
    let err = io::Error::last_os_error();
    tracing::debug!(pid, group_error = %group_err, error = %err, "SIGINT delivery failed");
    Err(err)
}

#[cfg(not(unix))]
pub fn interrupt(pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot interrupt pid {pid}: signals are unix-only"),
    ))
}
