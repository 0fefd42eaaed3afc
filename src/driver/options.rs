//! Browser launch options and W3C capabilities.
//!
//! Provides a type-safe interface for the browser a new session should
//! start: which browser, headless mode, window size, extra arguments and
//! the download directory used for PDF downloads.
//!
//! # Example
//!
//! ```ignore
//! use resilient_ui::BrowserOptions;
//!
//! let options = BrowserOptions::chrome()
//!     .with_headless()
//!     .with_window_size(1920, 1080)
//!     .with_download_dir("/tmp/downloads");
//!
//! let caps = options.capabilities();
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

// ============================================================================
// BrowserKind
// ============================================================================

/// Browser a session is created for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Google Chrome / Chromium via chromedriver.
    #[default]
    Chrome,
    /// Mozilla Firefox via geckodriver.
    Firefox,
}

impl BrowserKind {
    /// Returns the W3C `browserName` capability value.
    #[must_use]
    pub const fn browser_name(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
        }
    }

    /// Returns the vendor options capability key.
    #[must_use]
    pub const fn options_key(&self) -> &'static str {
        match self {
            Self::Chrome => "goog:chromeOptions",
            Self::Firefox => "moz:firefoxOptions",
        }
    }
}

// ============================================================================
// BrowserOptions
// ============================================================================

/// Browser process configuration for a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Browser to launch.
    pub browser: BrowserKind,

    /// Run without a GUI.
    pub headless: bool,

    /// Window dimensions in pixels (width, height).
    pub window_size: Option<(u32, u32)>,

    /// Accept self-signed or intercepted TLS certificates.
    pub accept_insecure_certs: bool,

    /// Directory downloads (including PDFs) are saved to.
    pub download_dir: Option<PathBuf>,

    /// Additional custom command-line arguments.
    pub extra_args: Vec<String>,
}

// ============================================================================
// Constructors
// ============================================================================

impl BrowserOptions {
    /// Creates options for the given browser with default settings.
    #[inline]
    #[must_use]
    pub fn new(browser: BrowserKind) -> Self {
        Self {
            browser,
            ..Default::default()
        }
    }

    /// Creates Chrome options.
    #[inline]
    #[must_use]
    pub fn chrome() -> Self {
        Self::new(BrowserKind::Chrome)
    }

    /// Creates Firefox options.
    #[inline]
    #[must_use]
    pub fn firefox() -> Self {
        Self::new(BrowserKind::Firefox)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BrowserOptions {
    /// Enables headless mode.
    #[inline]
    #[must_use]
    pub fn with_headless(mut self) -> Self {
        self.headless = true;
        self
    }

    /// Sets window size in pixels.
    #[inline]
    #[must_use]
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = Some((width, height));
        self
    }

    /// Accepts insecure TLS certificates.
    #[inline]
    #[must_use]
    pub fn with_insecure_certs(mut self) -> Self {
        self.accept_insecure_certs = true;
        self
    }

    /// Sets the download directory and forces PDFs to download.
    #[inline]
    #[must_use]
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// Adds a custom command-line argument.
    #[inline]
    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Adds multiple custom command-line arguments.
    #[inline]
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds the flags that keep Chrome stable in CI containers.
    #[must_use]
    pub fn with_ci_flags(self) -> Self {
        self.with_args([
            "--disable-extensions",
            "--disable-dev-shm-usage",
            "--no-sandbox",
            "--disable-gpu",
        ])
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl BrowserOptions {
    /// Converts options to browser command-line arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(4 + self.extra_args.len());

        if self.headless {
            args.push(match self.browser {
                BrowserKind::Chrome => "--headless=new".to_string(),
                BrowserKind::Firefox => "-headless".to_string(),
            });
        }

        if let Some((width, height)) = self.window_size {
            match self.browser {
                BrowserKind::Chrome => args.push(format!("--window-size={width},{height}")),
                BrowserKind::Firefox => {
                    args.push("-width".to_string());
                    args.push(width.to_string());
                    args.push("-height".to_string());
                    args.push(height.to_string());
                }
            }
        }

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Builds the W3C `capabilities` object for `New Session`.
    #[must_use]
    pub fn capabilities(&self) -> Value {
        let mut vendor = Map::new();
        vendor.insert("args".to_string(), json!(self.to_args()));

        if let Some(dir) = &self.download_dir {
            let dir = dir.display().to_string();
            let prefs = match self.browser {
                BrowserKind::Chrome => json!({
                    "download.default_directory": dir,
                    "download.prompt_for_download": false,
                    "download.directory_upgrade": true,
                    "plugins.always_open_pdf_externally": true,
                }),
                BrowserKind::Firefox => json!({
                    "browser.download.folderList": 2,
                    "browser.download.dir": dir,
                    "browser.helperApps.neverAsk.saveToDisk": "application/pdf",
                    "pdfjs.disabled": true,
                }),
            };
            vendor.insert("prefs".to_string(), prefs);
        }

        json!({
            "alwaysMatch": {
                "browserName": self.browser.browser_name(),
                "acceptInsecureCerts": self.accept_insecure_certs,
                (self.browser.options_key()): Value::Object(vendor),
            }
        })
    }

    /// Validates the options configuration.
    ///
    /// # Errors
    ///
    /// Returns error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if let Some((width, height)) = self.window_size
            && (width == 0 || height == 0)
        {
            return Err("Window dimensions must be greater than zero".to_string());
        }
        if let Some(dir) = &self.download_dir
            && dir.as_os_str().is_empty()
        {
            return Err("Download directory must not be empty".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
