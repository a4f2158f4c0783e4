//! Shared REST client for the consultation service.
//!
//! Every REST collaborator speaks the same envelope: `{code, msg, data}`
//! with `code == "success"` on the happy path. This client owns the
//! `reqwest::Client`, attaches the bearer token, maps HTTP status
//! failures, and unwraps the envelope so the adapters deal only in their
//! own DTOs.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use solace_application::CredentialProvider;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// The envelope code the service uses for accepted requests.
pub const SUCCESS_CODE: &str = "success";

/// Errors produced while talking to the REST service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered outside the 2xx range.
    #[error("Server returned HTTP {0}")]
    Status(u16),

    /// The envelope carried a non-success code.
    #[error("Request rejected ({code}): {message}")]
    Rejected { code: String, message: String },

    /// The body could not be decoded into the expected shape.
    #[error("Response malformed: {0}")]
    Decode(String),
}

/// The service's uniform response envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning a non-success code into
    /// [`ApiError::Rejected`] and a missing payload into
    /// [`ApiError::Decode`].
    pub fn into_data(self) -> Result<T, ApiError> {
        if self.code != SUCCESS_CODE {
            return Err(ApiError::Rejected {
                code: self.code,
                message: self.msg,
            });
        }
        self.data
            .ok_or_else(|| ApiError::Decode("envelope has no data".into()))
    }

    /// Check the envelope code, for endpoints whose payload is irrelevant.
    pub fn into_unit(self) -> Result<(), ApiError> {
        if self.code != SUCCESS_CODE {
            return Err(ApiError::Rejected {
                code: self.code,
                message: self.msg,
            });
        }
        Ok(())
    }
}

/// HTTP client bound to one service base URL and credential provider.
///
/// The configured timeout applies per request on the plain REST verbs.
/// It is deliberately not installed as the client-wide default, because
/// reqwest's client timeout keeps running while a response body streams —
/// it would cut off any reply stream longer than the timeout. Streaming
/// requests go through [`post_streaming`](Self::post_streaming), which is
/// bounded only by the connect timeout.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_timeout: timeout,
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.get(self.url(path)).timeout(self.request_timeout))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.post(self.url(path)).timeout(self.request_timeout))
    }

    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.put(self.url(path)).timeout(self.request_timeout))
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.delete(self.url(path)).timeout(self.request_timeout))
    }

    /// A POST with no response deadline, for endpoints whose body streams
    /// for as long as the conversation needs.
    pub fn post_streaming(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.post(self.url(path)))
    }

    /// Attach the bearer token, when the provider has one. Requests go
    /// out unauthenticated otherwise; the server's rejection then surfaces
    /// as an ordinary status/envelope error.
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.credentials.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request expecting an enveloped JSON payload.
    pub async fn expect_data<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let envelope = self.send::<T>(builder).await?;
        envelope.into_data()
    }

    /// Send a request expecting only an envelope acknowledgement.
    pub async fn expect_ok(&self, builder: reqwest::RequestBuilder) -> Result<(), ApiError> {
        let envelope = self.send::<serde_json::Value>(builder).await?;
        envelope.into_unit()
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!("API call failed with HTTP {status}");
            return Err(ApiError::Status(status.as_u16()));
        }

        response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_yields_data() {
        let envelope: Envelope<i64> =
            serde_json::from_value(json!({"code": "success", "msg": "", "data": 42})).unwrap();
        assert_eq!(envelope.into_data().unwrap(), 42);
    }

    #[test]
    fn non_success_code_is_rejected() {
        let envelope: Envelope<i64> =
            serde_json::from_value(json!({"code": "unauthorized", "msg": "token expired"}))
                .unwrap();
        let err = envelope.into_data().unwrap_err();
        assert_eq!(
            err,
            ApiError::Rejected {
                code: "unauthorized".into(),
                message: "token expired".into()
            }
        );
    }

    #[test]
    fn missing_data_on_success_is_a_decode_error() {
        let envelope: Envelope<i64> =
            serde_json::from_value(json!({"code": "success", "msg": "ok"})).unwrap();
        assert!(matches!(envelope.into_data(), Err(ApiError::Decode(_))));
    }

    #[test]
    fn unit_envelope_ignores_the_payload() {
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_value(json!({"code": "success", "data": null})).unwrap();
        assert!(envelope.into_unit().is_ok());
    }

    #[test]
    fn msg_defaults_to_empty() {
        let envelope: Envelope<i64> =
            serde_json::from_value(json!({"code": "error"})).unwrap();
        let err = envelope.into_unit().unwrap_err();
        assert_eq!(
            err,
            ApiError::Rejected {
                code: "error".into(),
                message: String::new()
            }
        );
    }
}
