//! Page state captured when a wait gives up.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::driver::WebDriver;
use crate::error::Result;

// ============================================================================
// Diagnostics
// ============================================================================

/// URL, title and optional screenshot of the page at a point in time.
///
/// Every field is best effort; a field the driver could not provide is
/// `None`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Current URL.
    pub url: Option<String>,
    /// Current title.
    pub title: Option<String>,
    /// PNG screenshot bytes.
    pub screenshot: Option<Vec<u8>>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("url", &self.url)
            .field("title", &self.title)
            .field("screenshot_bytes", &self.screenshot.as_ref().map(Vec::len))
            .finish()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "url={} title={}",
            self.url.as_deref().unwrap_or("<unknown>"),
            self.title.as_deref().unwrap_or("<unknown>")
        )
    }
}

impl Diagnostics {
    /// Captures the current page state. Never fails.
    pub async fn capture(driver: &dyn WebDriver, screenshot: bool) -> Self {
        let url = driver
            .current_url()
            .await
            .inspect_err(|e| debug!(error = %e, "Could not read URL for diagnostics"))
            .ok();
        let title = driver
            .title()
            .await
            .inspect_err(|e| debug!(error = %e, "Could not read title for diagnostics"))
            .ok();
        let screenshot = if screenshot {
            driver
                .screenshot_png()
                .await
                .inspect_err(|e| warn!(error = %e, "Screenshot capture failed"))
                .ok()
        } else {
            None
        };

        Self {
            url,
            title,
            screenshot,
        }
    }

    /// Writes the screenshot to `dir/name.png`.
    ///
    /// Returns `None` if no screenshot was captured.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the directory or file cannot be
    /// written.
    pub fn save_screenshot(&self, dir: &Path, name: &str) -> Result<Option<PathBuf>> {
        let Some(png) = &self.screenshot else {
            return Ok(None);
        };
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.png", sanitize(name)));
        std::fs::write(&path, png)?;
        debug!(path = %path.display(), bytes = png.len(), "Screenshot saved");
        Ok(Some(path))
    }
}

/// Keeps file names portable.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;

    #[tokio::test]
    async fn test_capture_reads_location() {
        let driver = MemoryDriver::new().with_location("https://shop.test/cart", "StackDemo");
        let diag = Diagnostics::capture(&driver, false).await;
        assert_eq!(diag.url.as_deref(), Some("https://shop.test/cart"));
        assert_eq!(diag.title.as_deref(), Some("StackDemo"));
        assert!(diag.screenshot.is_none());
        assert_eq!(diag.to_string(), "url=https://shop.test/cart title=StackDemo");
    }

    #[tokio::test]
    async fn test_capture_after_quit_is_empty() {
        let driver = MemoryDriver::new();
        driver.quit().await.unwrap();
        let diag = Diagnostics::capture(&driver, true).await;
        assert_eq!(diag, Diagnostics::default());
    }

    #[tokio::test]
    async fn test_save_screenshot() {
        let driver = MemoryDriver::new();
        let diag = Diagnostics::capture(&driver, true).await;
        let dir = tempfile::tempdir().unwrap();

        let path = diag
            .save_screenshot(dir.path(), "cart: increase/qty")
            .unwrap()
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "cart__increase_qty.png");
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }

    #[test]
    fn test_save_without_screenshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let saved = Diagnostics::default()
            .save_screenshot(dir.path(), "x")
            .unwrap();
        assert!(saved.is_none());
    }
}
