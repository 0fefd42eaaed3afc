//! W3C WebDriver session backend.
//!
//! Talks to chromedriver, geckodriver or a Selenium grid over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use resilient_ui::{BrowserOptions, W3cDriver, WebDriver};
//!
//! # async fn example() -> resilient_ui::Result<()> {
//! let driver = W3cDriver::connect("http://localhost:4444", &BrowserOptions::firefox()).await?;
//! driver.navigate("https://example.com").await?;
//! println!("{}", driver.current_url().await?);
//! driver.quit().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::identifiers::{ElementId, SessionId};
use crate::locator::By;
use crate::protocol::{Command, element_ids_from, element_reference};
use crate::transport::HttpTransport;

use super::options::BrowserOptions;
use super::{ScriptArg, WebDriver};

// ============================================================================
// W3cDriver
// ============================================================================

/// A live W3C WebDriver session.
pub struct W3cDriver {
    /// HTTP transport to the remote end.
    transport: HttpTransport,
    /// Session ID assigned by the remote end.
    session_id: SessionId,
}

impl fmt::Debug for W3cDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("W3cDriver")
            .field("remote", &self.transport.base().as_str())
            .field("session_id", &self.session_id)
            .finish()
    }
}

// ============================================================================
// W3cDriver - Constructor
// ============================================================================

impl W3cDriver {
    /// Opens a new session on the remote end at `url`.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `options` are invalid
    /// - [`Error::Connection`] if the remote end is unreachable
    /// - [`Error::Session`] if the remote end refuses the session
    pub async fn connect(url: &str, options: &BrowserOptions) -> Result<Self> {
        options.validate().map_err(Error::config)?;

        let transport = HttpTransport::new(url)?;
        let value = transport
            .new_session(Command::NewSession {
                capabilities: options.capabilities(),
            })
            .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(SessionId::new)
            .ok_or_else(|| Error::session(format!("No sessionId in response: {value}")))?;

        info!(
            session_id = %session_id,
            browser = options.browser.browser_name(),
            headless = options.headless,
            "Session started"
        );

        Ok(Self {
            transport,
            session_id,
        })
    }
}

// ============================================================================
// W3cDriver - Accessors
// ============================================================================

impl W3cDriver {
    /// Returns the session ID.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    async fn send(&self, command: Command) -> Result<Value> {
        self.transport.send(&self.session_id, command, None).await
    }

    async fn send_for(&self, element: &ElementId, command: Command) -> Result<Value> {
        self.transport
            .send(&self.session_id, command, Some(element))
            .await
    }
}

// ============================================================================
// WebDriver Implementation
// ============================================================================

#[async_trait]
impl WebDriver for W3cDriver {
    async fn find_elements(&self, parent: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>> {
        let (using, value) = by.to_w3c();
        let result = match parent {
            Some(element_id) => {
                self.send_for(
                    element_id,
                    Command::FindElementsFromElement {
                        element_id: element_id.clone(),
                        using,
                        value,
                    },
                )
                .await
            }
            None => self.send(Command::FindElements { using, value }).await,
        };

        // Remote ends disagree on whether an empty result is an error.
        match result {
            Ok(value) => element_ids_from(&value),
            Err(Error::ElementNotFound { .. }) => Ok(Vec::new()),
            Err(Error::InvalidSelector { message, .. }) => {
                Err(Error::invalid_selector(by.to_string(), message))
            }
            Err(e) => Err(e),
        }
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.send_for(
            element,
            Command::ElementClick {
                element_id: element.clone(),
            },
        )
        .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        self.send_for(
            element,
            Command::ElementSendKeys {
                element_id: element.clone(),
                text: text.to_string(),
            },
        )
        .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        self.send_for(
            element,
            Command::ElementClear {
                element_id: element.clone(),
            },
        )
        .await?;
        Ok(())
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        let value = self
            .send_for(
                element,
                Command::GetElementText {
                    element_id: element.clone(),
                },
            )
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
        let value = self
            .send_for(
                element,
                Command::GetElementAttribute {
                    element_id: element.clone(),
                    name: name.to_string(),
                },
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        let value = self
            .send_for(
                element,
                Command::IsElementDisplayed {
                    element_id: element.clone(),
                },
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        let value = self
            .send_for(
                element,
                Command::IsElementEnabled {
                    element_id: element.clone(),
                },
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool> {
        let value = self
            .send_for(
                element,
                Command::IsElementSelected {
                    element_id: element.clone(),
                },
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> Result<Value> {
        let context = args.iter().find_map(|arg| match arg {
            ScriptArg::Element(id) => Some(id.clone()),
            ScriptArg::Value(_) => None,
        });
        let args = args
            .into_iter()
            .map(|arg| match arg {
                ScriptArg::Element(id) => element_reference(&id),
                ScriptArg::Value(v) => v,
            })
            .collect();

        self.transport
            .send(
                &self.session_id,
                Command::ExecuteScript {
                    script: script.to_string(),
                    args,
                },
                context.as_ref(),
            )
            .await
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, "Navigating");
        self.send(Command::Navigate {
            url: url.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let value = self.send(Command::GetCurrentUrl).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn title(&self) -> Result<String> {
        let value = self.send(Command::GetTitle).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let value = self.send(Command::TakeScreenshot).await?;
        let encoded = value
            .as_str()
            .ok_or_else(|| Error::protocol("Screenshot response is not a string"))?;
        Ok(BASE64.decode(encoded)?)
    }

    async fn quit(&self) -> Result<()> {
        self.send(Command::DeleteSession).await?;
        info!(session_id = %self.session_id, "Session ended");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_invalid_options() {
        let options = BrowserOptions::chrome().with_window_size(0, 0);
        let err = W3cDriver::connect("http://127.0.0.1:9", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let err = W3cDriver::connect("nonsense", &BrowserOptions::chrome())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Url(_)));
    }
}
