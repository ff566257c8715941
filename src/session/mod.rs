//! Per-page check sessions.
//!
//! Each page load gets its own [`InnSession`]: a result list, a form, and
//! the broadcast channels its SSE stream listens on. Sessions are identified
//! by UUID and kept in a [`SessionStore`] shared across handlers.
//!
//! # Example
//!
//! ```rust
//! use inn_check::session::SessionStore;
//!
//! let store = SessionStore::new();
//! let session = store.create();
//! assert!(session.with_form(|form| form.submit("7707083893")).is_some());
//! assert!(store.get(session.id()).is_some());
//! ```

mod store;

pub use store::{InnSession, SessionStore};
