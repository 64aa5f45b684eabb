//! Outbound SMS provider client.
//!
//! A thin pass-through to the external messaging provider: request in,
//! JSON out. Provider failures are surfaced as `ExternalService` errors
//! with the provider's payload attached; nothing here retries.

use crate::config::Config;
use crate::errors::{ServiceError, ServiceResult};
use crate::services::settings_service::ProviderCredentials;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub to: String,
    pub from: String,
    pub body: String,
}

pub struct SmsService {
    client: reqwest::Client,
    default_base_url: String,
}

impl SmsService {
    pub fn new() -> ServiceResult<Self> {
        let config = Config::from_env()
            .map_err(|e| ServiceError::internal_error(format!("Config error: {e}")))?;

        Ok(SmsService {
            client: reqwest::Client::new(),
            default_base_url: config.sms_provider_base_url,
        })
    }

    /// Sends one message through the provider. The provider's JSON
    /// response is passed back untouched.
    pub async fn send_message(
        &self,
        credentials: &ProviderCredentials,
        request: &SendMessageRequest,
    ) -> ServiceResult<Value> {
        let url = format!("{}/messages", self.base_url(credentials));

        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.api_key, Some(&credentials.api_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::external_service(format!("SMS provider error: {e}")))?;

        Self::into_json(response).await
    }

    /// Lists messages for a number. Passed through verbatim.
    pub async fn list_messages(
        &self,
        credentials: &ProviderCredentials,
        phone_number: &str,
    ) -> ServiceResult<Value> {
        let url = format!("{}/messages", self.base_url(credentials));

        let response = self
            .client
            .get(&url)
            .basic_auth(&credentials.api_key, Some(&credentials.api_secret))
            .query(&[("phone_number", phone_number)])
            .send()
            .await
            .map_err(|e| ServiceError::external_service(format!("SMS provider error: {e}")))?;

        Self::into_json(response).await
    }

    fn base_url<'c>(&'c self, credentials: &'c ProviderCredentials) -> &'c str {
        credentials
            .base_url
            .as_deref()
            .unwrap_or(&self.default_base_url)
    }

    async fn into_json(response: reqwest::Response) -> ServiceResult<Value> {
        let status = response.status();
        let payload = response
            .text()
            .await
            .map_err(|e| ServiceError::external_service(format!("SMS provider error: {e}")))?;

        if !status.is_success() {
            // Attach the provider's error payload for the caller.
            return Err(ServiceError::external_service(format!(
                "SMS provider returned {status}: {payload}"
            )));
        }

        serde_json::from_str(&payload)
            .map_err(|e| ServiceError::external_service(format!("Invalid provider response: {e}")))
    }
}
