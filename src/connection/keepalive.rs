//! Keep-alive driver.
//!
//! Sends a `ping` request through the normal send path every period while
//! the engine is initialized. Failures are logged and otherwise ignored; a
//! dead socket is detected by the dispatch loop, not here.

use crate::{connection::engine::WsEngine, error::SurrealLinkError};
use log::debug;
use std::{sync::Weak, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

pub(crate) fn spawn_keepalive(
    engine: Weak<WsEngine>,
    period: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(engine) = engine.upgrade() else {
                        break;
                    };
                    if !engine.is_connected() {
                        continue;
                    }

                    match engine.send("ping", Vec::new(), true, Some(&token)).await {
                        Ok(_) => debug!("[surreal-link] Keep-alive ping ok (engine {})", engine.id()),
                        Err(SurrealLinkError::Cancelled) | Err(SurrealLinkError::Disposed) => break,
                        Err(e) => debug!(
                            "[surreal-link] Keep-alive ping failed (engine {}): {}",
                            engine.id(),
                            e
                        ),
                    }
                }
            }
        }

        debug!("[surreal-link] Keep-alive stopped");
    })
}
