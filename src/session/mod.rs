//! Session state and history management.

pub mod compress;
pub mod store;

pub use compress::needs_compression;
pub use store::{Session, SessionId, SessionStore};
