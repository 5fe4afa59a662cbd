//! Expiry timer for deferred requests.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::correlation::registry::RegistryHandle;
use crate::correlation::types::ReplyId;

/// Deliver the synthetic 504 for `id` once `window` has elapsed.
///
/// The timer is never cancelled. If the real completion got there first the
/// registry no longer has an entry, the expiry is dropped and it is not
/// counted as a timeout.
pub fn spawn_expiry(registry: RegistryHandle, id: ReplyId, window: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(window).await;
        tracing::debug!(reply_id = %id, window = ?window, "Reply window elapsed");
        registry.expire(id);
    })
}
