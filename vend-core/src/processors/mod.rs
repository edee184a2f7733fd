//! Long-running tasks of the client.
//!
//! - [`EventListener`]: applies push events to the client state
//! - [`ConnectionDriver`]: owns the push connection and publishes what it
//!   receives
//!
//! Both take their shutdown signal and input channels in `run()`.

mod connection;
mod listener;

pub use connection::ConnectionDriver;
pub use listener::EventListener;

use tokio::sync::watch;

/// Resolve once shutdown is signaled. A dropped sender counts as shutdown.
pub(crate) async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}
