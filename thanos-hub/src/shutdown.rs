//! Process shutdown trigger

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Wait for Ctrl+C or SIGTERM, then cancel `cancel`
///
/// Also returns as soon as `cancel` is cancelled elsewhere, so the task
/// running this does not outlive a server that stopped on its own.
pub async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = ctrl_c => info!("Ctrl+C received, stopping hub"),
        _ = terminate => info!("SIGTERM received, stopping hub"),
    }
    cancel.cancel();
}
