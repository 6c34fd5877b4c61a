// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Periodic dispatch loop

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Dispatcher;

/// Starts the background dispatch loop
///
/// The first pass runs immediately, then one per `interval`. Each pass is
/// awaited before the next tick, so passes never overlap.
pub fn start_dispatch_loop(
    mut shutdown_rx: watch::Receiver<bool>,
    dispatcher: Arc<Dispatcher>,
    interval: Duration,
) -> JoinHandle<()> {
    tracing::info!(
        "Starting background dispatch loop every {}s",
        interval.as_secs()
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Stopping dispatch loop");
                        break;
                    }
                }
            }

            // Errors are logged and counted by run_pass
            let _ = dispatcher.run_pass().await;
        }
    })
}
