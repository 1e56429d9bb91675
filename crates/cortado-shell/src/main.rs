use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use cortado_core::Session;
use cortado_core::reminders::LocalReminders;
use cortado_store::{SqliteStore, Store};
use cortado_types::api::NewProfile;

/// Headless application shell: sign in, watch the inbox, print conversation
/// summaries as they change, sign out on ctrl-c.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cortado=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("CORTADO_DB_PATH").unwrap_or_else(|_| "cortado.db".into());
    let email = std::env::var("CORTADO_EMAIL").unwrap_or_else(|_| "me@example.com".into());
    let full_name = std::env::var("CORTADO_NAME").unwrap_or_else(|_| "Cortado User".into());

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&PathBuf::from(&db_path))?);

    // First run registers the profile; later runs sign back in.
    let profile = match store.profile_by_email(&email).await? {
        Some(profile) => profile,
        None => {
            store
                .create_profile(NewProfile {
                    email: email.clone(),
                    full_name,
                    ..Default::default()
                })
                .await?
        }
    };

    let session = Session::sign_in(store, Arc::new(LocalReminders), profile.id).await?;
    info!("signed in as {} <{}>", session.profile().full_name, email);

    let mut inbox = session.watch_inbox();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = inbox.changed() => {
                if changed.is_err() {
                    break;
                }
                for conversation in inbox.borrow_and_update().iter() {
                    info!(
                        counterparty = %conversation.counterparty.full_name,
                        unread = conversation.unread_count,
                        last = conversation
                            .last_message
                            .as_ref()
                            .map(|m| m.content.as_str())
                            .unwrap_or(""),
                        "conversation"
                    );
                }
            }
        }
    }

    session.sign_out().await?;
    Ok(())
}
