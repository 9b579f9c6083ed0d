//! Background jobs.
//!
//! Each submodule exposes a long-running `run` meant for `tokio::spawn`
//! that stops when its [`CancellationToken`](tokio_util::sync::CancellationToken)
//! fires.

pub mod overdue_invoices;
