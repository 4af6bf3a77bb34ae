//! Background sync on reconnect.

use crate::engine::{SyncEngine, SyncTrigger};
use crate::port::RemoteDataPort;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vetsync_sync_protocol::UserId;

/// Spawns a task that runs a background sync for `user` after every
/// debounced reconnect.
///
/// The subscription is taken before this function returns, so a reconnect
/// right after the call is not missed. Each sync runs on the blocking pool
/// and finishes before the task listens again. Abort the returned handle to
/// stop listening.
///
/// # Panics
///
/// Must be called from within a tokio runtime.
pub fn spawn_reconnect_sync<P>(engine: Arc<SyncEngine<P>>, user: UserId) -> JoinHandle<()>
where
    P: RemoteDataPort + 'static,
{
    let mut reconnects = engine.monitor().subscribe(engine.config().reconnect_debounce);
    tokio::spawn(async move {
        while reconnects.reconnected().await {
            debug!(user = %user, "reconnected, starting background sync");
            let run = {
                let engine = Arc::clone(&engine);
                let user = user.clone();
                tokio::task::spawn_blocking(move || engine.sync(&user, SyncTrigger::Background))
            };
            match run.await {
                Ok(Ok(summary)) => {
                    debug!(user = %user, outcome = ?summary.outcome, "reconnect sync finished")
                }
                Ok(Err(err)) => warn!(user = %user, error = %err, "reconnect sync failed"),
                Err(err) => warn!(user = %user, error = %err, "reconnect sync task panicked"),
            }
        }
    })
}
