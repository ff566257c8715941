//! Realtime check channel.
//!
//! A submission is pushed on the [`TOPIC`] topic as a [`CheckRequest`]; the
//! validation service answers with a [`ChannelReply`]. Replies are routed to
//! the owning session explicitly through [`dispatch`], never via shared
//! page-global state.

mod http;

pub use http::HttpValidator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::form::CheckRequest;
use crate::inn_list::ResultEntry;
use crate::session::InnSession;

/// Topic used for both the request and its reply.
pub const TOPIC: &str = "services:inn-check";

/// Message shown when the service could not be reached or answered garbage.
pub const UNAVAILABLE_MESSAGE: &str = "Сервис проверки недоступен, попробуйте позже";

/// Error body carried in a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyError {
    pub message: String,
}

/// Reply delivered on [`TOPIC`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelReply {
    Result { result: ResultEntry },
    Error { error: ReplyError },
}

impl ChannelReply {
    pub fn error(message: impl Into<String>) -> Self {
        ChannelReply::Error {
            error: ReplyError {
                message: message.into(),
            },
        }
    }
}

/// External validation service.
#[async_trait]
pub trait InnValidator: Send + Sync {
    /// Push a check request and wait for its reply.
    async fn check(&self, request: &CheckRequest) -> Result<ChannelReply>;
}

/// Route a reply to its session: update the form, push any result to the
/// list, then republish the form.
pub fn dispatch(session: &InnSession, reply: ChannelReply) {
    let entry = session.with_form(|form| form.on_reply(reply));
    if let Some(entry) = entry {
        info!(
            name: "inn.check.result",
            session_id = %session.id(),
            inn = %entry.identifier,
            valid = entry.is_valid,
            "Check result received"
        );
        session.with_list(|list| list.push(entry));
    }
    session.publish_form();
}

/// Run one check end to end and dispatch whatever comes back.
///
/// Transport and decoding failures are reported to the form as
/// [`UNAVAILABLE_MESSAGE`] so the submit button is always re-enabled.
pub async fn run_check(validator: &dyn InnValidator, session: InnSession, request: CheckRequest) {
    info!(
        name: "inn.check.submitted",
        session_id = %session.id(),
        topic = TOPIC,
        inn = %request.inn,
        "Check pushed"
    );

    let reply = match validator.check(&request).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(
                name: "inn.check.failed",
                session_id = %session.id(),
                error = %e,
                "Validation service call failed"
            );
            ChannelReply::error(UNAVAILABLE_MESSAGE)
        }
    };

    dispatch(&session, reply);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::inn_list::DEFAULT_CAPACITY;

    struct FixedValidator(ChannelReply);

    #[async_trait]
    impl InnValidator for FixedValidator {
        async fn check(&self, _request: &CheckRequest) -> Result<ChannelReply> {
            Ok(self.0.clone())
        }
    }

    struct DownValidator;

    #[async_trait]
    impl InnValidator for DownValidator {
        async fn check(&self, _request: &CheckRequest) -> Result<ChannelReply> {
            Err(Error::Service {
                status: 503,
                message: "unavailable".into(),
            })
        }
    }

    #[test]
    fn test_reply_wire_shapes() {
        let ok: ChannelReply = serde_json::from_str(
            r#"{"result":{"inn":"7707083893","time":"2024-01-01T10:00","result":true}}"#,
        )
        .unwrap();
        assert!(matches!(ok, ChannelReply::Result { .. }));

        let err: ChannelReply =
            serde_json::from_str(r#"{"error":{"message":"bad inn"}}"#).unwrap();
        assert_eq!(err, ChannelReply::error("bad inn"));

        let bad = serde_json::from_str::<ChannelReply>(
            r#"{"result":{"inn":"1","time":"??","result":true}}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_dispatch_result_pushes_to_list() {
        let session = InnSession::new(DEFAULT_CAPACITY);
        session.with_form(|form| form.submit("7707083893"));
        let mut list_rx = session.subscribe_list();

        let entry = ResultEntry::parse("7707083893", "2024-01-01T10:00", true).unwrap();
        dispatch(&session, ChannelReply::Result { result: entry });

        assert_eq!(session.with_list(|list| list.len()), 1);
        assert!(!session.with_form(|form| form.submit_disabled()));
        assert!(list_rx.try_recv().unwrap().contains("7707083893"));
    }

    #[test]
    fn test_dispatch_error_leaves_list_alone() {
        let session = InnSession::new(DEFAULT_CAPACITY);
        let mut form_rx = session.subscribe_form();

        dispatch(&session, ChannelReply::error("ИНН не найден"));

        assert!(session.with_list(|list| list.is_empty()));
        assert_eq!(session.with_form(|form| form.message().to_string()), "ИНН не найден");
        assert!(form_rx.try_recv().unwrap().contains("ИНН не найден"));
    }

    #[tokio::test]
    async fn test_run_check_success() {
        let entry = ResultEntry::parse("500100732259", "2024-05-05T15:45", false).unwrap();
        let validator = FixedValidator(ChannelReply::Result { result: entry });
        let session = InnSession::new(2);
        let request = session.with_form(|form| form.submit("500100732259")).unwrap();

        run_check(&validator, session.clone(), request).await;

        assert!(session.list_html().contains("05.05.2024 15:45"));
        assert!(session.list_html().contains("некорректен"));
    }

    #[tokio::test]
    async fn test_run_check_transport_failure_reenables_submit() {
        let session = InnSession::new(2);
        let request = session.with_form(|form| form.submit("7707083893")).unwrap();

        run_check(&DownValidator, session.clone(), request).await;

        assert!(!session.with_form(|form| form.submit_disabled()));
        assert_eq!(
            session.with_form(|form| form.message().to_string()),
            UNAVAILABLE_MESSAGE
        );
        assert!(session.with_list(|list| list.is_empty()));
    }
}
