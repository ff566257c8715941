//! INN check UI
//!
//! Server-rendered page for checking taxpayer identifiers (INN) against an
//! external validation service, with a live, bounded list of recent results.
//!
//! # Architecture
//!
//! - **Server**: Axum routes serving htmx fragments and an SSE stream per session
//! - **Result list**: fixed-capacity, newest-first list that re-renders on every push
//! - **Channel**: request/reply transport to the validation service
//! - **Sessions**: per-page list and form state, shared through [`AppState`]
//!
//! # Modules
//!
//! - [`inn_list`]: bounded result list and its render surfaces
//! - [`form`]: check form state and length rule
//! - [`channel`]: validation transport and reply dispatch
//! - [`session`]: session state and storage

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::unused_async)]

pub mod channel;
pub mod config;
pub mod error;
pub mod form;
pub mod inn_list;
pub mod security;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod ui;

use std::fmt;
use std::sync::Arc;

use crate::channel::InnValidator;
use crate::config::AppConfig;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Per-page check sessions.
    pub sessions: SessionStore,
    /// Transport to the validation service.
    pub validator: Arc<dyn InnValidator>,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
