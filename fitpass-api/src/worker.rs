use std::sync::Arc;

use chrono::Utc;
use fitpass_order::AuthorizationReaper;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// Background loop expiring authorizations whose settlement callback
/// never arrived. Runs for the lifetime of the process.
pub async fn start_reaper_worker(reaper: Arc<AuthorizationReaper>, interval_seconds: u64) {
    info!(interval_seconds, "authorization reaper started");

    loop {
        sleep(Duration::from_secs(interval_seconds)).await;

        match reaper.run_once(Utc::now()).await {
            Ok(0) => {}
            Ok(reaped) => info!(reaped, "expired stale authorizations"),
            Err(e) => error!(error = %e, "reaper sweep failed"),
        }
    }
}
