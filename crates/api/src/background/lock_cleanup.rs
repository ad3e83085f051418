//! Periodic removal of expired content locks.

use std::time::Duration;

use folio_core::content_lock::LOCK_CLEANUP_INTERVAL_SECS;
use folio_db::repositories::ContentLockRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Run the expired-lock cleanup loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let period = Duration::from_secs(LOCK_CLEANUP_INTERVAL_SECS);
    tracing::info!(interval_secs = period.as_secs(), "Lock cleanup job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Lock cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match ContentLockRepo::cleanup_expired(&pool).await {
                    Ok(0) => tracing::trace!("Lock cleanup: nothing expired"),
                    Ok(deleted) => tracing::info!(deleted, "Lock cleanup: removed expired locks"),
                    Err(e) => tracing::error!(error = %e, "Lock cleanup failed"),
                }
            }
        }
    }
}
