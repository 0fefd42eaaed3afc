//! HTTP connection to a W3C remote end.
//!
//! One [`HttpTransport`] wraps a `reqwest` client and the remote end base
//! URL. Each command is one request; there is no pipelining, so the engine
//! issues exactly one DOM query or action at a time.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{ElementId, SessionId};
use crate::protocol::{Command, HttpMethod, Response};
use crate::wait::poller::duration_ms;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for a single command round trip.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Placeholder used to build the `New Session` path.
const NO_SESSION: &str = "";

// ============================================================================
// HttpTransport
// ============================================================================

/// Blocking-per-command HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
    /// Remote end base URL, always ending with `/`.
    base: Url,
}

impl HttpTransport {
    /// Creates a transport for the remote end at `url`.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `url` does not parse
    /// - [`Error::Config`] if the URL is not http(s)
    /// - [`Error::Http`] if the client cannot be built
    pub fn new(url: &str) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_COMMAND_TIMEOUT)
    }

    /// Creates a transport with a custom per-command timeout.
    ///
    /// # Errors
    ///
    /// See [`HttpTransport::new`].
    pub fn with_timeout(url: &str, command_timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "WebDriver URL must be http or https, got: {url}"
            )));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(command_timeout)
            .build()?;

        Ok(Self { client, base })
    }

    /// Returns the remote end base URL.
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Sends `New Session` and returns the raw result value.
    ///
    /// # Errors
    ///
    /// Returns the mapped error if the remote end refuses the session.
    pub async fn new_session(&self, command: Command) -> Result<Value> {
        self.send(&SessionId::new(NO_SESSION), command, None).await
    }

    /// Sends a command and returns the result value.
    ///
    /// `context` is the element targeted by the command, used for error
    /// mapping.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the remote end is unreachable
    /// - Mapped W3C errors from the response payload
    pub async fn send(
        &self,
        session: &SessionId,
        command: Command,
        context: Option<&ElementId>,
    ) -> Result<Value> {
        let url = self.base.join(&command.path(session))?;
        let name = command.name();

        trace!(command = name, %url, "Sending WebDriver command");

        let request = match command.method() {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Delete => self.client.delete(url),
            HttpMethod::Post => {
                let body = command.body().unwrap_or_else(|| Value::Object(Default::default()));
                self.client.post(url).json(&body)
            }
        };

        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                Error::connection(e.to_string())
            } else if e.is_timeout() {
                Error::timeout(format!("command {name}"), duration_ms(DEFAULT_COMMAND_TIMEOUT))
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        let parsed: Response = response.json().await?;

        debug!(command = name, status = status.as_u16(), "WebDriver response");
        parsed.into_result(status.is_success(), context)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_gets_trailing_slash() {
        let transport = HttpTransport::new("http://localhost:4444/wd/hub").unwrap();
        assert_eq!(transport.base().as_str(), "http://localhost:4444/wd/hub/");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = HttpTransport::new("ws://localhost:4444").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_rejects_garbage_url() {
        assert!(matches!(HttpTransport::new("not a url"), Err(Error::Url(_))));
    }

    #[test]
    fn test_join_keeps_prefix() {
        let transport = HttpTransport::new("http://localhost:4444/wd/hub").unwrap();
        let path = Command::GetTitle.path(&SessionId::new("s1"));
        let url = transport.base().join(&path).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4444/wd/hub/session/s1/title");
    }

    #[tokio::test]
    async fn test_unreachable_remote_is_connection_error() {
        // Port 9 (discard) is closed on test machines.
        let transport = HttpTransport::new("http://127.0.0.1:9").unwrap();
        let err = transport
            .send(&SessionId::new("s"), Command::GetTitle, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Connection { .. } | Error::Http(_)));
    }
}
