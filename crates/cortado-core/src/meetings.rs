use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cortado_store::Store;
use cortado_types::api::{MeetingQuery, NewMeeting};
use cortado_types::models::{Meeting, MeetingStatus};

use crate::error::AppError;
use crate::reminders::ReminderScheduler;

/// Meeting screen. Organizer creates, either participant confirms or cancels.
/// `completed` is never written here — it belongs to external tooling.
#[derive(Clone)]
pub struct MeetingsService {
    store: Arc<dyn Store>,
    reminders: Arc<dyn ReminderScheduler>,
    user_id: Uuid,
}

impl MeetingsService {
    pub(crate) fn new(
        store: Arc<dyn Store>,
        reminders: Arc<dyn ReminderScheduler>,
        user_id: Uuid,
    ) -> Self {
        Self {
            store,
            reminders,
            user_id,
        }
    }

    pub async fn schedule(
        &self,
        attendee_id: Uuid,
        scheduled_at: DateTime<Utc>,
        duration_minutes: u32,
        note: Option<String>,
    ) -> Result<Meeting, AppError> {
        if attendee_id == self.user_id {
            return Err(AppError::SelfTarget);
        }

        let meeting = self
            .store
            .insert_meeting(NewMeeting {
                organizer_id: self.user_id,
                attendee_id,
                scheduled_at,
                duration_minutes,
                note,
            })
            .await?;

        // Best effort; a failed or skipped reminder never fails the action.
        self.reminders.schedule_reminder(&meeting);

        Ok(meeting)
    }

    pub async fn confirm(&self, meeting_id: Uuid) -> Result<Meeting, AppError> {
        let meeting = self.participant_meeting(meeting_id).await?;
        if meeting.status != MeetingStatus::Pending {
            return Err(AppError::MeetingTransition {
                id: meeting_id,
                from: meeting.status,
                to: MeetingStatus::Confirmed,
            });
        }

        let confirmed = self
            .store
            .update_meeting_status(meeting_id, MeetingStatus::Confirmed)
            .await?;

        self.reminders.notify(
            "Meeting confirmed",
            &format!("Confirmed for {}", confirmed.scheduled_at),
        );

        Ok(confirmed)
    }

    pub async fn cancel(&self, meeting_id: Uuid) -> Result<Meeting, AppError> {
        let meeting = self.participant_meeting(meeting_id).await?;
        if !matches!(
            meeting.status,
            MeetingStatus::Pending | MeetingStatus::Confirmed
        ) {
            return Err(AppError::MeetingTransition {
                id: meeting_id,
                from: meeting.status,
                to: MeetingStatus::Cancelled,
            });
        }

        Ok(self
            .store
            .update_meeting_status(meeting_id, MeetingStatus::Cancelled)
            .await?)
    }

    /// Meetings at or after now, soonest first.
    pub async fn upcoming(&self) -> Result<Vec<Meeting>, AppError> {
        Ok(self
            .store
            .list_meetings(MeetingQuery {
                participant: self.user_id,
                scheduled_after: Some(Utc::now()),
                status: None,
            })
            .await?)
    }

    async fn participant_meeting(&self, meeting_id: Uuid) -> Result<Meeting, AppError> {
        let meeting = self
            .store
            .meeting(meeting_id)
            .await?
            .ok_or(AppError::NotFound {
                entity: "meeting",
                id: meeting_id,
            })?;

        if !meeting.involves(self.user_id) {
            return Err(AppError::NotParticipant {
                entity: "meeting",
                user: self.user_id,
                id: meeting_id,
            });
        }

        Ok(meeting)
    }
}
