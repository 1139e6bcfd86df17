//! Traffic-control dashboard on the console.
//!
//! Prints the board every time the active list changes. Pass `--clear` to
//! mark the alert on display as cleared as soon as it shows up.

use preclear::client::{AlertsClient, LiveAlerts};
use preclear::config::ClientConfig;
use preclear::views::{DispatcherBoard, DispatcherView};

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        log::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ClientConfig::env()?;
    config.log();

    let auto_clear = std::env::args().any(|arg| arg == "--clear");

    let client = AlertsClient::new(&config.api_url)?;
    let board = DispatcherBoard::new(LiveAlerts::new(client, config.poll_interval));
    let mut updates = board.subscribe();

    let mut last = None;
    loop {
        tokio::select! {
            changed = updates.changed() => changed?,
            _ = tokio::signal::ctrl_c() => break,
        }

        let view = board.view();
        if last.as_ref() == Some(&view) {
            continue;
        }
        println!("{view}");

        if let (true, DispatcherView::Incoming(alert)) = (auto_clear, &view) {
            match board.clear(alert.id).await {
                Ok(_) => log::info!("Route cleared for {}", alert.ambulance_id),
                Err(e) => log::error!("Failed to clear alert {}: {e}", alert.id),
            }
        }
        last = Some(view);
    }

    Ok(())
}
