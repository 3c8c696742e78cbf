use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

use super::Transport;

/// Wraps a transport and, while enabled, logs every request and response
/// verbatim through `tracing`.
///
/// The request and the outcome pass through untouched whether logging is on
/// or off. The switch is atomic so it can be flipped on a shared client.
pub struct DebugTransport<T> {
    inner: T,
    enabled: AtomicBool,
}

impl<T: Transport> DebugTransport<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            enabled: AtomicBool::new(false),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for DebugTransport<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        if !self.is_enabled() {
            return self.inner.send(request);
        }

        info!(
            target: "jpush::http",
            method = %request.method,
            url = %request.url,
            query = ?request.query,
            headers = ?request.headers,
            body = request.body.as_deref().unwrap_or(""),
            "request"
        );

        let result = self.inner.send(request);
        match &result {
            Ok(response) => info!(
                target: "jpush::http",
                status = response.status,
                headers = ?response.headers,
                body = %response.body,
                "response"
            ),
            Err(err) => info!(target: "jpush::http", error = %err, "transport error"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::http::Headers;

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run `f` with a subscriber that writes into the returned buffer.
    fn capture_logs(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.text()
    }

    struct Fixed(u16, &'static str);

    impl Transport for Fixed {
        fn send(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            Ok(HttpResponse::new(self.0, self.1))
        }
    }

    struct Refused;

    impl Transport for Refused {
        fn send(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::Transport("connection refused".to_string()))
        }
    }

    fn request() -> HttpRequest {
        HttpRequest::get("http://localhost/v3/devices/abc", &[], &Headers::new())
    }

    fn update_request() -> HttpRequest {
        let headers: Headers = [("Authorization", "Basic YWJjOmRlZg==")].into_iter().collect();
        HttpRequest::post_json(
            "http://localhost/v3/devices/reg123",
            &serde_json::json!({"alias": "bob"}),
            &headers,
        )
        .unwrap()
    }

    #[test]
    fn disabled_by_default() {
        assert!(!DebugTransport::new(Fixed(200, "{}")).is_enabled());
    }

    #[test]
    fn toggling_does_not_change_the_response() {
        let transport = DebugTransport::new(Fixed(400, r#"{"error":{"code":1,"message":"x"}}"#));
        let quiet = transport.send(&request()).unwrap();
        transport.set_enabled(true);
        let loud = transport.send(&request()).unwrap();
        assert_eq!(quiet, loud);
    }

    #[test]
    fn transport_errors_pass_through_when_enabled() {
        let transport = DebugTransport::new(Refused);
        transport.set_enabled(true);
        let err = transport.send(&request()).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn enabled_logs_one_request_and_one_response() {
        let transport = DebugTransport::new(Fixed(200, "device-updated"));
        transport.set_enabled(true);

        let logs = capture_logs(|| {
            transport.send(&update_request()).unwrap();
        });

        let lines: Vec<&str> = logs.lines().collect();
        assert_eq!(lines.len(), 2, "{logs}");
        assert!(lines[0].contains("request"));
        assert!(lines[0].contains("POST"));
        assert!(lines[0].contains("http://localhost/v3/devices/reg123"));
        assert!(lines[0].contains("Basic YWJjOmRlZg=="));
        assert!(lines[0].contains("alias") && lines[0].contains("bob"));
        assert!(lines[1].contains("response"));
        assert!(lines[1].contains("status=200"));
        assert!(lines[1].contains("device-updated"));
    }

    #[test]
    fn enabled_logs_transport_errors() {
        let transport = DebugTransport::new(Refused);
        transport.set_enabled(true);

        let logs = capture_logs(|| {
            transport.send(&request()).unwrap_err();
        });

        assert_eq!(logs.lines().count(), 2, "{logs}");
        assert!(logs.contains("connection refused"));
    }

    #[test]
    fn disabled_logs_nothing() {
        let transport = DebugTransport::new(Fixed(200, "device-updated"));

        let logs = capture_logs(|| {
            transport.send(&update_request()).unwrap();
        });

        assert!(logs.is_empty(), "{logs}");
    }
}
