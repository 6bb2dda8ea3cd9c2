use async_trait::async_trait;
use tracing::info;

use super::{LeaveNotification, Notifier, NotifyError};

/// Writes notifications to the log. Mail delivery sits behind the same trait
/// in deployments that have a relay.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: LeaveNotification) -> Result<(), NotifyError> {
        let payload =
            serde_json::to_string(&notification).map_err(|e| NotifyError(e.to_string()))?;
        info!(
            kind = notification.kind(),
            to = notification.recipient(),
            %payload,
            "Leave notification"
        );
        Ok(())
    }
}
