//! Scoped driver sessions.
//!
//! [`with_session`] runs a journey against a freshly connected driver and
//! quits the session on every exit path: success, error and panic.
//!
//! ```no_run
//! use resilient_ui::session::with_session;
//! use resilient_ui::{BrowserOptions, Engine, Result, Target, W3cDriver, WebDriver};
//!
//! # async fn example() -> Result<()> {
//! let options = BrowserOptions::default();
//! let connect = W3cDriver::connect("http://localhost:4444", &options);
//! let heading = with_session(connect, async |driver: &W3cDriver| {
//!     driver.navigate("https://bstackdemo.com/").await?;
//!     let engine = Engine::new(driver);
//!     Ok(engine.read_text(&Target::new("heading", "h1")).await)
//! })
//! .await?;
//! println!("{heading:?}");
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures_util::FutureExt;
use tracing::{info, warn};

use crate::driver::WebDriver;
use crate::error::Result;

/// Connects, runs `journey`, then always quits the session.
///
/// A failed quit is logged and does not override the journey's result. A
/// panic inside the journey is resumed after the session has been quit.
///
/// # Errors
///
/// Returns the connection error, or the journey's error.
pub async fn with_session<D, C, F, T>(connect: C, journey: F) -> Result<T>
where
    D: WebDriver,
    C: Future<Output = Result<D>>,
    F: AsyncFnOnce(&D) -> Result<T>,
{
    let driver = connect.await?;
    info!("Session scope entered");

    let outcome = AssertUnwindSafe(journey(&driver)).catch_unwind().await;

    match driver.quit().await {
        Ok(()) => info!("Session scope exited"),
        Err(e) => warn!(error = %e, "Session teardown failed"),
    }

    match outcome {
        Ok(result) => result,
        Err(payload) => panic::resume_unwind(payload),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::driver::MemoryDriver;
    use crate::error::Error;
    use crate::identifiers::ElementId;

    fn shared() -> (Arc<MemoryDriver>, Arc<MemoryDriver>) {
        let driver = Arc::new(MemoryDriver::new().with_location("https://shop.test/", "Shop"));
        let handle = Arc::clone(&driver);
        (driver, handle)
    }

    #[tokio::test]
    async fn test_quits_after_success() {
        let (driver, handle) = shared();
        let title = with_session(async { Ok(handle) }, async |d: &Arc<MemoryDriver>| {
            d.title().await
        })
        .await
        .unwrap();

        assert_eq!(title, "Shop");
        assert!(driver.is_quit());
    }

    #[tokio::test]
    async fn test_quits_after_error() {
        let (driver, handle) = shared();
        let result = with_session(async { Ok(handle) }, async |d: &Arc<MemoryDriver>| {
            d.click(&ElementId::new("missing")).await
        })
        .await;

        assert!(matches!(result, Err(Error::ElementNotFound { .. })));
        assert!(driver.is_quit());
    }

    async fn explode(_driver: &Arc<MemoryDriver>) -> Result<()> {
        panic!("journey exploded");
    }

    #[tokio::test]
    async fn test_quits_before_resuming_panic() {
        let (driver, handle) = shared();
        let caught = AssertUnwindSafe(with_session(async { Ok(handle) }, explode))
            .catch_unwind()
            .await;

        assert!(caught.is_err());
        assert!(driver.is_quit());
    }

    #[tokio::test]
    async fn test_connect_failure_skips_journey() {
        let result: Result<()> = with_session(
            async { Err::<MemoryDriver, _>(Error::connection("refused")) },
            async |_d: &MemoryDriver| Ok(()),
        )
        .await;
        assert!(matches!(result, Err(Error::Connection { .. })));
    }
}
