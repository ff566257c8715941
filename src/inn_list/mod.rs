//! Bounded, newest-first list of INN check results.
//!
//! [`InnList`] keeps at most `capacity` results sorted by descending
//! timestamp and re-renders its whole [`RenderSurface`] on every push.
//!
//! # Example
//!
//! ```rust
//! use inn_check::inn_list::{BufferSurface, InnList, ResultEntry};
//!
//! let mut list = InnList::new(BufferSurface::new(), Vec::new(), 2);
//! list.push(ResultEntry::parse("1111111111", "2024-01-01T10:00", true).unwrap());
//!
//! assert_eq!(
//!     list.surface().content(),
//!     "<li><span>[01.01.2024 10:00]</span> 1111111111 : корректен</li>"
//! );
//! ```

mod surface;
pub mod timestamp;

pub use surface::{BroadcastSurface, BufferSurface, RenderSurface};

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::ui::escape;

/// Retention used when no capacity is configured.
pub const DEFAULT_CAPACITY: usize = 10;

/// Label for an identifier the service accepted.
pub const VALID_LABEL: &str = "корректен";

/// Label for an identifier the service rejected.
pub const INVALID_LABEL: &str = "некорректен";

/// One validation outcome as delivered by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Submitted tax identifier.
    #[serde(rename = "inn", alias = "identifier")]
    pub identifier: String,
    /// Moment the result was produced.
    #[serde(
        rename = "time",
        alias = "timestamp",
        serialize_with = "timestamp::serialize",
        deserialize_with = "timestamp::deserialize"
    )]
    pub timestamp: DateTime<FixedOffset>,
    /// Whether the identifier passed validation.
    #[serde(rename = "result", alias = "isValid")]
    pub is_valid: bool,
}

impl ResultEntry {
    pub fn new(
        identifier: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
        is_valid: bool,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            timestamp,
            is_valid,
        }
    }

    /// Build an entry from a wire timestamp string; `None` if it does not parse.
    pub fn parse(identifier: impl Into<String>, time: &str, is_valid: bool) -> Option<Self> {
        timestamp::parse(time).map(|ts| Self::new(identifier, ts, is_valid))
    }

    pub fn label(&self) -> &'static str {
        if self.is_valid {
            VALID_LABEL
        } else {
            INVALID_LABEL
        }
    }

    /// Markup for a single row.
    pub fn render_row(&self) -> String {
        format!(
            "<li><span>[{}]</span> {} : {}</li>",
            timestamp::format_display(&self.timestamp),
            escape(&self.identifier),
            self.label()
        )
    }
}

/// Fixed-capacity result list that owns its display surface.
#[derive(Debug)]
pub struct InnList<S> {
    entries: Vec<ResultEntry>,
    capacity: usize,
    surface: S,
}

impl<S: RenderSurface> InnList<S> {
    /// Seed the list without rendering.
    ///
    /// `initial` is taken as-is: it is neither trimmed to `capacity` nor
    /// sorted until the first push.
    pub fn new(surface: S, initial: Vec<ResultEntry>, capacity: usize) -> Self {
        Self {
            entries: initial,
            capacity: capacity.max(1),
            surface,
        }
    }

    pub fn with_default_capacity(surface: S, initial: Vec<ResultEntry>) -> Self {
        Self::new(surface, initial, DEFAULT_CAPACITY)
    }

    /// Record a result, evict overflow, re-sort and re-render.
    pub fn push(&mut self, entry: ResultEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
        // Stable: equal timestamps keep their pre-sort order, so the newest push wins ties.
        self.entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.render();
    }

    /// Replace the surface content with the current entries.
    pub fn render(&mut self) {
        let markup = self.markup();
        self.surface.replace_all(markup);
    }

    /// Markup for the current entries, without touching the surface.
    pub fn markup(&self) -> String {
        self.entries.iter().map(ResultEntry::render_row).collect()
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
