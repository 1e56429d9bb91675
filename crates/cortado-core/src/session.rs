use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;
use uuid::Uuid;

use cortado_store::Store;
use cortado_types::api::ProfilePatch;
use cortado_types::models::{Conversation, PresenceStatus, UserProfile};

use crate::chat::ChatService;
use crate::connections::ConnectionsService;
use crate::directory::DirectoryService;
use crate::error::AppError;
use crate::meetings::MeetingsService;
use crate::reminders::ReminderScheduler;
use crate::watcher::{self, InboxWatcher};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Coalescing window for inbox change bursts.
    pub inbox_debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inbox_debounce: Duration::from_millis(250),
        }
    }
}

/// The application session: constructed once at sign-in, handed to whatever
/// needs it, torn down explicitly at sign-out. Owns the store handle, the
/// reminder scheduler and every background watcher it spawned.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn Store>,
    reminders: Arc<dyn ReminderScheduler>,
    profile: RwLock<UserProfile>,
    config: SessionConfig,
    watchers: Mutex<Vec<InboxWatcher>>,
}

impl Session {
    pub async fn sign_in(
        store: Arc<dyn Store>,
        reminders: Arc<dyn ReminderScheduler>,
        user_id: Uuid,
    ) -> Result<Self, AppError> {
        Self::sign_in_with(store, reminders, user_id, SessionConfig::default()).await
    }

    pub async fn sign_in_with(
        store: Arc<dyn Store>,
        reminders: Arc<dyn ReminderScheduler>,
        user_id: Uuid,
        config: SessionConfig,
    ) -> Result<Self, AppError> {
        let mut profile = store.profile(user_id).await?.ok_or(AppError::NotFound {
            entity: "profile",
            id: user_id,
        })?;

        store.set_presence(user_id, PresenceStatus::Available).await?;
        profile.status = PresenceStatus::Available;
        info!(user = %user_id, "signed in");

        Ok(Self {
            inner: Arc::new(SessionInner {
                store,
                reminders,
                profile: RwLock::new(profile),
                config,
                watchers: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn user_id(&self) -> Uuid {
        self.profile().id
    }

    pub fn profile(&self) -> UserProfile {
        self.inner
            .profile
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // -- Screens --

    pub fn directory(&self) -> DirectoryService {
        DirectoryService::new(self.inner.store.clone(), self.user_id())
    }

    pub fn connections(&self) -> ConnectionsService {
        ConnectionsService::new(self.inner.store.clone(), self.user_id())
    }

    pub fn meetings(&self) -> MeetingsService {
        MeetingsService::new(
            self.inner.store.clone(),
            self.inner.reminders.clone(),
            self.user_id(),
        )
    }

    pub fn chat(&self) -> ChatService {
        ChatService::new(self.inner.store.clone(), self.user_id())
    }

    /// Spawn (and track) a background inbox watcher; returns the receiver the
    /// messages screen renders from.
    pub fn watch_inbox(&self) -> watch::Receiver<Vec<Conversation>> {
        let watcher = watcher::spawn(
            self.inner.store.clone(),
            self.user_id(),
            self.inner.config.inbox_debounce,
        );
        let rx = watcher.subscribe();
        self.inner
            .watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(watcher);
        rx
    }

    // -- Own profile --

    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<UserProfile, AppError> {
        let updated = self.inner.store.update_profile(self.user_id(), patch).await?;
        *self
            .inner
            .profile
            .write()
            .unwrap_or_else(|e| e.into_inner()) = updated.clone();
        Ok(updated)
    }

    pub async fn set_presence(&self, status: PresenceStatus) -> Result<(), AppError> {
        self.inner.store.set_presence(self.user_id(), status).await?;
        self.inner
            .profile
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .status = status;
        Ok(())
    }

    /// Explicit teardown: stop every watcher, flip presence to offline.
    pub async fn sign_out(self) -> Result<(), AppError> {
        let user_id = self.user_id();

        for watcher in self
            .inner
            .watchers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain(..)
        {
            watcher.abort();
        }

        self.inner
            .store
            .set_presence(user_id, PresenceStatus::Offline)
            .await?;
        info!(user = %user_id, "signed out");
        Ok(())
    }
}
