//! HTTP transport to the validation service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::{ChannelReply, InnValidator, TOPIC};
use crate::error::{Error, Result};
use crate::form::CheckRequest;

/// Posts check requests as JSON to a fixed endpoint.
#[derive(Debug, Clone)]
pub struct HttpValidator {
    client: Client,
    endpoint: Url,
}

impl HttpValidator {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl InnValidator for HttpValidator {
    async fn check(&self, request: &CheckRequest) -> Result<ChannelReply> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-channel-topic", TOPIC)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(Error::Service {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        tracing::debug!(
            name: "inn.check.reply",
            status = status.as_u16(),
            bytes = body.len(),
            "Validation service replied"
        );

        Ok(serde_json::from_slice(&body)?)
    }
}
