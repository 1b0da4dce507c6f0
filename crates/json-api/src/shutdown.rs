//! Graceful shutdown
//!
//! The server keeps serving until SIGINT or SIGTERM arrives, then drains
//! in-flight requests. [`GRACE_PERIOD`] bounds how long a slow request can
//! hold the process up after the signal.

use std::{io, time::Duration};

use salvo::server::ServerHandle;
use thiserror::Error;
use tracing::info;

/// How long in-flight requests get to finish once a signal arrives.
const GRACE_PERIOD: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
#[error("failed to install {signal} handler")]
pub(crate) struct ShutdownSignalError {
    signal: &'static str,

    #[source]
    source: io::Error,
}

/// Block until a termination signal arrives, then ask the server to drain.
pub(crate) async fn listen(handle: ServerHandle) -> Result<(), ShutdownSignalError> {
    let signal = termination_signal().await?;

    info!(signal, "shutting down");

    handle.stop_graceful(GRACE_PERIOD);

    Ok(())
}

#[cfg(unix)]
async fn termination_signal() -> Result<&'static str, ShutdownSignalError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt()).map_err(|source| ShutdownSignalError {
        signal: "SIGINT",
        source,
    })?;

    let mut terminate = signal(SignalKind::terminate()).map_err(|source| ShutdownSignalError {
        signal: "SIGTERM",
        source,
    })?;

    Ok(tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    })
}

#[cfg(not(unix))]
async fn termination_signal() -> Result<&'static str, ShutdownSignalError> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|source| ShutdownSignalError {
            signal: "Ctrl+C",
            source,
        })?;

    Ok("Ctrl+C")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_failures_name_the_signal() {
        let error = ShutdownSignalError {
            signal: "SIGTERM",
            source: io::Error::other("handler table full"),
        };

        assert_eq!(error.to_string(), "failed to install SIGTERM handler");
    }
}
