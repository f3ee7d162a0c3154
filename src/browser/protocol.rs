//! Minimal WebDriver wire client.
//!
//! Speaks only the subset needed for scripted evaluation: status polling,
//! session creation, synchronous script execution, and session deletion.
//! Single round-trip per call; retry and timeout policy belongs to the
//! orchestrator, not this layer.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

/// Failures surfaced by the wire client.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("driver transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid driver endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("driver rejected the request: {error}: {message}")]
    Driver { error: String, message: String },
    #[error("malformed driver response: {0}")]
    Malformed(String),
}

/// Every WebDriver response wraps its payload in a `value` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct DriverStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    message: String,
}

/// Thin client over the driver's loopback HTTP endpoint.
pub struct DriverClient {
    http: Client,
    base_url: Url,
}

impl DriverClient {
    pub fn new(base_url: Url) -> Result<Self, ProtocolError> {
        let http = Client::builder().build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProtocolError> {
        Ok(self.base_url.join(path)?)
    }

    /// Reports whether the driver is ready to create sessions.
    ///
    /// Transport errors and malformed bodies mean not-ready; this never
    /// surfaces an error because it backs the startup polling loop.
    pub async fn ping(&self) -> bool {
        let Ok(url) = self.endpoint("/status") else {
            return false;
        };
        let Ok(response) = self.http.get(url).send().await else {
            return false;
        };
        match response.json::<Envelope<DriverStatus>>().await {
            Ok(body) => body.value.ready,
            Err(_) => false,
        }
    }

    /// Opens a fresh headless session and returns its identifier.
    pub async fn create_session(&self) -> Result<String, ProtocolError> {
        let url = self.endpoint("/session")?;
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "firefox",
                    "moz:firefoxOptions": {
                        "args": ["-headless"]
                    }
                }
            }
        });

        let response = self.http.post(url).json(&capabilities).send().await?;
        let status = response.status();
        let raw: Value = response.json().await?;
        if !status.is_success() {
            return Err(driver_error(&raw));
        }

        let session = serde_json::from_value::<Envelope<NewSession>>(raw)
            .map_err(|err| ProtocolError::Malformed(err.to_string()))?;
        log::debug!("opened session {}", session.value.session_id);
        Ok(session.value.session_id)
    }

    /// Executes a script synchronously in the given session and returns the
    /// raw `value` field of the response.
    pub async fn execute_sync(&self, session_id: &str, script: &str) -> Result<Value, ProtocolError> {
        let url = self.endpoint(&format!("/session/{session_id}/execute/sync"))?;
        let body = json!({ "script": script, "args": [] });

        let response = self.http.post(url).json(&body).send().await?;
        let status = response.status();
        let raw: Value = response.json().await?;
        if !status.is_success() {
            return Err(driver_error(&raw));
        }

        let envelope = serde_json::from_value::<Envelope<Value>>(raw)
            .map_err(|err| ProtocolError::Malformed(err.to_string()))?;
        Ok(envelope.value)
    }

    /// Tears the session down. By the time this runs a verdict (or a
    /// terminal error) already exists, so failures are logged and swallowed.
    pub async fn delete_session(&self, session_id: &str) {
        let url = match self.endpoint(&format!("/session/{session_id}")) {
            Ok(url) => url,
            Err(err) => {
                log::warn!("could not build delete endpoint for session {session_id}: {err}");
                return;
            }
        };
        match self.http.delete(url).send().await {
            Ok(response) if !response.status().is_success() => {
                log::warn!(
                    "driver answered {} deleting session {session_id}",
                    response.status()
                );
            }
            Ok(_) => log::debug!("deleted session {session_id}"),
            Err(err) => log::warn!("failed to delete session {session_id}: {err}"),
        }
    }
}

fn driver_error(raw: &Value) -> ProtocolError {
    match serde_json::from_value::<Envelope<WireError>>(raw.clone()) {
        Ok(body) => ProtocolError::Driver {
            error: body.value.error,
            message: body.value.message,
        },
        Err(_) => ProtocolError::Malformed(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_envelope_decodes() {
        let body = json!({"value": {"ready": true, "message": "ready"}});
        let envelope: Envelope<DriverStatus> = serde_json::from_value(body).unwrap();
        assert!(envelope.value.ready);

        let body = json!({"value": {"message": "still starting"}});
        let envelope: Envelope<DriverStatus> = serde_json::from_value(body).unwrap();
        assert!(!envelope.value.ready);
    }

    #[test]
    fn session_envelope_decodes_camel_case() {
        let body = json!({"value": {"sessionId": "abc123", "capabilities": {}}});
        let envelope: Envelope<NewSession> = serde_json::from_value(body).unwrap();
        assert_eq!(envelope.value.session_id, "abc123");
    }

    #[test]
    fn driver_errors_keep_their_kind() {
        let body = json!({"value": {"error": "session not created", "message": "no firefox"}});
        match driver_error(&body) {
            ProtocolError::Driver { error, message } => {
                assert_eq!(error, "session not created");
                assert_eq!(message, "no firefox");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unrecognized_error_bodies_are_malformed() {
        let body = json!({"weird": true});
        assert!(matches!(
            driver_error(&body),
            ProtocolError::Malformed(_)
        ));
    }
}
