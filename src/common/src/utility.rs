use tokio::sync::broadcast;
use tracing::{error, info};

/// Broadcasts once on ctrl-c. Every long-running task holds a resubscribed receiver.
pub async fn create_shutdown_channel() -> broadcast::Receiver<()> {
    let (shutdown_sender, shutdown_receiver): (broadcast::Sender<()>, broadcast::Receiver<()>) =
        broadcast::channel::<()>(100);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            // Keep the sender alive, a dropped sender would read as shutdown
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
        info!("signal received, starting graceful shutdown");
        let _ = shutdown_sender.send(());
    });
    shutdown_receiver
}

