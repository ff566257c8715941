//! INN check form state.
//!
//! Mirrors what the page shows: the input value, whether the submit button
//! is disabled while a check is in flight, and the message line.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelReply;
use crate::inn_list::ResultEntry;
use crate::ui::escape;

/// Shown when the submitted value has the wrong length.
pub const LENGTH_MESSAGE: &str = "ИНН должен состоять из 10 или 12 символов";

/// Payload pushed on the `services:inn-check` topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub inn: String,
}

/// Form state for one session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InnForm {
    input: String,
    submit_disabled: bool,
    message: String,
}

impl InnForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit `value`.
    ///
    /// Only 10- or 12-character values are sent. On success the input and
    /// message are cleared and submit stays disabled until a reply arrives;
    /// otherwise the value is kept and the length message is shown.
    pub fn submit(&mut self, value: &str) -> Option<CheckRequest> {
        match value.chars().count() {
            10 | 12 => {
                self.input.clear();
                self.submit_disabled = true;
                self.message.clear();
                Some(CheckRequest {
                    inn: value.to_string(),
                })
            }
            _ => {
                self.input = value.to_string();
                self.message = LENGTH_MESSAGE.to_string();
                None
            }
        }
    }

    /// Copy a helper example into the input.
    pub fn fill_from_helper(&mut self, text: &str) {
        self.input = text.trim().to_string();
    }

    /// Apply a reply from the channel.
    ///
    /// Returns the entry the caller must push to its list, if any. Submit is
    /// re-enabled either way.
    pub fn on_reply(&mut self, reply: ChannelReply) -> Option<ResultEntry> {
        self.submit_disabled = false;
        match reply {
            ChannelReply::Result { result } => Some(result),
            ChannelReply::Error { error } => {
                self.message = error.message;
                None
            }
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn submit_disabled(&self) -> bool {
        self.submit_disabled
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Form fragment posting to the given session.
    pub fn render(&self, session_id: &str) -> String {
        let disabled = if self.submit_disabled { " disabled" } else { "" };
        format!(
            r#"<form id="inn-form" hx-post="/sessions/{id}/inn-check" hx-swap="outerHTML">
    <input id="inn-form-input" name="inn" type="text" value="{input}" autocomplete="off">
    <button id="inn-form-submit" type="submit"{disabled}>Проверить</button>
    <div id="inn-form-messages">{message}</div>
</form>"#,
            id = escape(session_id),
            input = escape(&self.input),
            message = escape(&self.message),
        )
    }
}
