//! Periodic sweep flagging unpaid invoices past their due date.
//!
//! List and summary queries already treat such invoices as overdue; the
//! sweep makes the stored status agree so filters on `status` stay cheap.

use std::time::Duration;

use ashley_db::repositories::InvoiceRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

const DEFAULT_INTERVAL_SECS: u64 = 3600;

pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let interval_secs: u64 = std::env::var("OVERDUE_SCAN_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_INTERVAL_SECS);

    tracing::info!(interval_secs, "Overdue invoice scanner started");
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Overdue invoice scanner stopping");
                break;
            }
            _ = interval.tick() => {
                match InvoiceRepo::mark_overdue(&pool).await {
                    Ok(0) => tracing::debug!("Overdue scan: nothing to flag"),
                    Ok(flagged) => tracing::info!(flagged, "Overdue scan: invoices flagged"),
                    Err(e) => tracing::error!(error = %e, "Overdue scan failed"),
                }
            }
        }
    }
}
