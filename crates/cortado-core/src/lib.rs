pub mod chat;
pub mod connections;
pub mod conversation;
pub mod directory;
pub mod error;
pub mod meetings;
pub mod reminders;
pub mod session;
pub mod watcher;

pub use error::AppError;
pub use session::{Session, SessionConfig};
