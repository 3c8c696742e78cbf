use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

use super::Transport;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocking transport backed by a pooled `ureq::Agent`.
///
/// The agent reuses keep-alive connections and is safe to share across
/// threads. Status codes are never turned into errors here.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            agent: ureq::Agent::config_builder()
                .timeout_global(Some(Duration::from_secs(timeout_secs)))
                .http_status_as_error(false)
                .build()
                .new_agent(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut req = self.agent.get(&request.url);
                for (key, value) in &request.query {
                    req = req.query(key, value);
                }
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                req.call()
            }
            HttpMethod::Post => {
                let mut req = self.agent.post(&request.url);
                for (key, value) in &request.query {
                    req = req.query(key, value);
                }
                for (name, value) in &request.headers {
                    req = req.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => req.send(body.as_bytes()),
                    None => req.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| {
            ApiError::Transport(format!("{} {} failed: {e}", request.method, request.url))
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
