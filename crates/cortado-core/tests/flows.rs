use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use cortado_core::directory::DirectoryFilter;
use cortado_core::reminders::NoopReminders;
use cortado_core::{AppError, Session, SessionConfig};
use cortado_store::{SqliteStore, Store};
use cortado_types::api::{NewProfile, ProfilePatch};
use cortado_types::models::{ConnectionStatus, MeetingStatus, PresenceStatus, UserProfile};

fn open_store() -> Arc<dyn Store> {
    Arc::new(SqliteStore::open_in_memory().unwrap())
}

async fn seed(store: &Arc<dyn Store>, name: &str, industry: Option<&str>) -> UserProfile {
    store
        .create_profile(NewProfile {
            email: format!("{name}@example.com"),
            full_name: name.to_string(),
            industry: industry.map(str::to_string),
            ..Default::default()
        })
        .await
        .unwrap()
}

async fn session_for(store: &Arc<dyn Store>, user: &UserProfile) -> Session {
    Session::sign_in(store.clone(), Arc::new(NoopReminders), user.id)
        .await
        .unwrap()
}

#[tokio::test]
async fn connection_request_lifecycle() {
    let store = open_store();
    let ada = seed(&store, "ada", None).await;
    let bob = seed(&store, "bob", None).await;

    let ada_session = session_for(&store, &ada).await;
    let bob_session = session_for(&store, &bob).await;

    let request = ada_session.connections().request(bob.id).await.unwrap();
    assert_eq!(request.status, ConnectionStatus::Pending);

    // Re-requesting the same person is refused.
    let duplicate = ada_session.connections().request(bob.id).await;
    assert!(matches!(duplicate, Err(AppError::DuplicateRequest { .. })));

    // Self-requests are refused.
    let own = ada_session.connections().request(ada.id).await;
    assert!(matches!(own, Err(AppError::SelfTarget)));

    let incoming = bob_session.connections().incoming().await.unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].id, request.id);

    let outgoing = ada_session.connections().outgoing().await.unwrap();
    assert_eq!(outgoing.len(), 1);

    // The requester cannot answer their own request.
    let wrong_side = ada_session.connections().accept(request.id).await;
    assert!(matches!(wrong_side, Err(AppError::NotRequested { .. })));

    let accepted = bob_session.connections().accept(request.id).await.unwrap();
    assert_eq!(accepted.status, ConnectionStatus::Accepted);

    // Accepted is terminal.
    let settled = bob_session.connections().reject(request.id).await;
    assert!(matches!(settled, Err(AppError::ConnectionSettled { .. })));

    // Both sides see the established connection.
    for session in [&ada_session, &bob_session] {
        let accepted = session.connections().accepted().await.unwrap();
        assert_eq!(accepted.len(), 1);
    }
}

#[tokio::test]
async fn meeting_confirm_and_cancel_guards() {
    let store = open_store();
    let ada = seed(&store, "ada", None).await;
    let bob = seed(&store, "bob", None).await;

    let ada_session = session_for(&store, &ada).await;
    let bob_session = session_for(&store, &bob).await;
    let carol = seed(&store, "carol", None).await;
    let carol_session = session_for(&store, &carol).await;

    let meeting = ada_session
        .meetings()
        .schedule(
            bob.id,
            Utc::now() + chrono::Duration::hours(2),
            30,
            Some("espresso bar on 5th".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(meeting.status, MeetingStatus::Pending);

    // A third party can touch nothing.
    let outsider = carol_session.meetings().confirm(meeting.id).await;
    assert!(matches!(outsider, Err(AppError::NotParticipant { .. })));

    // The attendee confirms.
    let confirmed = bob_session.meetings().confirm(meeting.id).await.unwrap();
    assert_eq!(confirmed.status, MeetingStatus::Confirmed);

    // Confirm is only valid from pending.
    let again = bob_session.meetings().confirm(meeting.id).await;
    assert!(matches!(again, Err(AppError::MeetingTransition { .. })));

    // Either participant may cancel a confirmed meeting.
    let cancelled = ada_session.meetings().cancel(meeting.id).await.unwrap();
    assert_eq!(cancelled.status, MeetingStatus::Cancelled);

    // Cancelled is terminal for this app.
    let dead = bob_session.meetings().cancel(meeting.id).await;
    assert!(matches!(dead, Err(AppError::MeetingTransition { .. })));

    let upcoming = ada_session.meetings().upcoming().await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].status, MeetingStatus::Cancelled);
}

#[tokio::test]
async fn chat_aggregation_end_to_end() {
    let store = open_store();
    let ada = seed(&store, "ada", None).await;
    let bob = seed(&store, "bob", None).await;

    let ada_session = session_for(&store, &ada).await;
    let bob_session = session_for(&store, &bob).await;

    bob_session.chat().send(ada.id, "coffee this week?").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    bob_session.chat().send(ada.id, "thursday works for me").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    ada_session.chat().send(bob.id, "thursday it is").await.unwrap();

    let conversations = ada_session.chat().conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);

    let thread = &conversations[0];
    assert_eq!(thread.counterparty.id, bob.id);
    assert_eq!(thread.counterparty.full_name, "bob");
    assert_eq!(thread.unread_count, 2);
    assert_eq!(
        thread.last_message.as_ref().map(|m| m.content.as_str()),
        Some("thursday it is")
    );

    // Opening the thread returns it oldest-first and clears the unread flags.
    let messages = ada_session.chat().open_thread(bob.id).await.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].content, "coffee this week?");
    assert_eq!(messages[2].content, "thursday it is");

    let after = ada_session.chat().conversations().await.unwrap();
    assert_eq!(after[0].unread_count, 0);
}

#[tokio::test]
async fn silent_counterparty_resolved_via_batch_lookup() {
    let store = open_store();
    let ada = seed(&store, "ada", None).await;
    let carol = seed(&store, "carol", None).await;

    let ada_session = session_for(&store, &ada).await;

    // Carol never replies, so no fetched message carries her profile.
    ada_session.chat().send(carol.id, "ping").await.unwrap();

    let conversations = ada_session.chat().conversations().await.unwrap();
    assert_eq!(conversations.len(), 1);
    assert_eq!(conversations[0].counterparty.id, carol.id);
    assert_eq!(conversations[0].counterparty.full_name, "carol");
    assert_eq!(conversations[0].unread_count, 0);
}

#[tokio::test]
async fn inbox_watcher_coalesces_a_burst() {
    let store = open_store();
    let ada = seed(&store, "ada", None).await;
    let bob = seed(&store, "bob", None).await;

    let ada_session = Session::sign_in_with(
        store.clone(),
        Arc::new(NoopReminders),
        ada.id,
        SessionConfig {
            inbox_debounce: Duration::from_millis(50),
        },
    )
    .await
    .unwrap();
    let bob_session = session_for(&store, &bob).await;

    let mut inbox = ada_session.watch_inbox();

    for content in ["one", "two", "three"] {
        bob_session.chat().send(ada.id, content).await.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            inbox.changed().await.unwrap();
            let snapshot = inbox.borrow_and_update().clone();
            if snapshot.iter().any(|c| c.counterparty.id == bob.id && c.unread_count == 3) {
                break;
            }
        }
    })
    .await
    .expect("watcher never published the aggregated burst");

    ada_session.sign_out().await.unwrap();
}

#[tokio::test]
async fn directory_browse_filters_and_searches() {
    let store = open_store();
    let me = seed(&store, "me", Some("fintech")).await;
    let _ada = seed(&store, "ada", Some("fintech")).await;
    let bob = seed(&store, "bob", Some("health")).await;
    store
        .update_profile(
            bob.id,
            ProfilePatch {
                title: Some("Staff Engineer".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let session = session_for(&store, &me).await;

    let everyone = session.directory().browse(DirectoryFilter::default()).await.unwrap();
    assert_eq!(everyone.len(), 2);
    assert!(everyone.iter().all(|p| p.id != me.id));

    let fintech = session
        .directory()
        .browse(DirectoryFilter {
            industry: Some("fintech".to_string()),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(fintech.len(), 1);
    assert_eq!(fintech[0].full_name, "ada");

    let by_title = session
        .directory()
        .browse(DirectoryFilter {
            industry: None,
            search: Some("staff eng".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].id, bob.id);
}

#[tokio::test]
async fn session_presence_and_sign_out() {
    let store = open_store();
    let ada = seed(&store, "ada", None).await;

    let session = session_for(&store, &ada).await;
    assert_eq!(
        store.profile(ada.id).await.unwrap().unwrap().status,
        PresenceStatus::Available
    );

    session.set_presence(PresenceStatus::Busy).await.unwrap();
    assert_eq!(session.profile().status, PresenceStatus::Busy);
    assert_eq!(
        store.profile(ada.id).await.unwrap().unwrap().status,
        PresenceStatus::Busy
    );

    let updated = session
        .update_profile(ProfilePatch {
            title: Some("Founder".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.title.as_deref(), Some("Founder"));
    assert_eq!(session.profile().title.as_deref(), Some("Founder"));

    session.sign_out().await.unwrap();
    assert_eq!(
        store.profile(ada.id).await.unwrap().unwrap().status,
        PresenceStatus::Offline
    );
}
