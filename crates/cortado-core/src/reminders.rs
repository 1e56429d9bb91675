use chrono::Utc;
use tracing::{debug, info};

use cortado_types::models::Meeting;

/// Local-notification seam. Both operations are fire-and-forget and
/// best-effort; failures never propagate to the triggering action.
pub trait ReminderScheduler: Send + Sync {
    /// Arrange a reminder for 15 minutes before the meeting starts.
    fn schedule_reminder(&self, meeting: &Meeting);

    /// Fire an immediate local notification.
    fn notify(&self, title: &str, body: &str);
}

/// For platforms without local notifications.
pub struct NoopReminders;

impl ReminderScheduler for NoopReminders {
    fn schedule_reminder(&self, _meeting: &Meeting) {}
    fn notify(&self, _title: &str, _body: &str) {}
}

/// Timer-backed implementation. Delivery here is a structured log line; the
/// platform notification hook sits outside this crate.
pub struct LocalReminders;

impl ReminderScheduler for LocalReminders {
    fn schedule_reminder(&self, meeting: &Meeting) {
        let delay = match (meeting.reminder_at() - Utc::now()).to_std() {
            Ok(delay) => delay,
            Err(_) => {
                debug!(meeting = %meeting.id, "reminder time already passed, skipping");
                return;
            }
        };

        let meeting = meeting.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!(
                meeting = %meeting.id,
                at = %meeting.scheduled_at,
                "meeting starts in 15 minutes"
            );
        });
    }

    fn notify(&self, title: &str, body: &str) {
        info!(%title, %body, "local notification");
    }
}
