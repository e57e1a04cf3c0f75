//! Shutdown signal handling for long-running commands.

use crate::libs::messages::Message;
use crate::{msg_error, msg_info};
use tokio::sync::oneshot;

/// Spawns a signal listener and returns a receiver that resolves on the
/// first SIGTERM/SIGINT (or Ctrl-C on Windows).
///
/// If no handler can be installed the receiver never resolves and the
/// caller runs until its own input ends.
pub fn listen() -> oneshot::Receiver<()> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    #[cfg(unix)]
    {
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};

            let (mut sigterm, mut sigint) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    msg_error!(Message::SignalHandlerFailed(e.to_string()));
                    let _keep = shutdown_tx;
                    return std::future::pending::<()>().await;
                }
            };

            tokio::select! {
                _ = sigterm.recv() => msg_info!(Message::ReceivedSigterm),
                _ = sigint.recv() => msg_info!(Message::ReceivedSigint),
            }

            let _ = shutdown_tx.send(());
        });
    }

    #[cfg(windows)]
    {
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                msg_error!(Message::SignalHandlerFailed(e.to_string()));
                let _keep = shutdown_tx;
                return std::future::pending::<()>().await;
            }
            msg_info!(Message::ReceivedCtrlC);

            let _ = shutdown_tx.send(());
        });
    }

    #[cfg(not(any(unix, windows)))]
    {
        crate::msg_warning!(Message::SignalHandlingNotSupported);
        std::mem::forget(shutdown_tx);
    }

    shutdown_rx
}
