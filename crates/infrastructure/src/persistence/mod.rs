//! File-backed persistence.

mod file_session_store;

pub use file_session_store::{ACCESS_TOKEN_FILE, FileSessionStore, SESSION_FILE};
