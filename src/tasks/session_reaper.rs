use crate::reveal::RevealRegistry;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

// Tears down reveals nobody has pressed a button on for `max_idle`
pub async fn reap_idle_sessions_task(registry: Arc<RevealRegistry>, every: Duration, max_idle: Duration) {
    info!("Starting background task to reap idle reveal sessions...");
    let mut interval = interval(every);

    loop {
        interval.tick().await; // Wait for the next interval tick
        let reaped = registry.reap_idle(max_idle);
        if reaped > 0 {
            info!("Reaped {} idle reveal session(s), {} still active.", reaped, registry.len());
        } else {
            debug!("No idle reveal sessions to reap.");
        }
    }
}
