//! Small shared helpers.

use std::time::Duration;

use tokio::sync::watch;

/// Sleeps for `delay` unless the shutdown flag fires first. Returns `false`
/// on shutdown. A closed shutdown channel counts as shutdown.
pub(crate) async fn interruptible_sleep(
    delay: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    tokio::select! {
        _ = shutdown.changed() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
