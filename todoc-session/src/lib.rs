// Durable key-value storage shared by the session and the app
pub mod storage;

mod error;
mod session;
mod settings;

pub use error::SessionError;
pub use session::{Credentials, SessionState, SessionStore};
pub use settings::Settings;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
