//! Page objects for the StackDemo storefront.
//!
//! Every page object is a thin layer over [`Engine`](crate::Engine): it
//! names the targets, picks the condition that proves an operation worked,
//! and chooses the timeout. None of them touches the driver directly for
//! anything but reads.
//!
//! | Page | Operations |
//! |------|------------|
//! | [`CartPage`] | items, quantity, subtotal, increase, remove |
//! | [`ProductPage`] | titles, add to cart |
//! | [`SearchPage`] | search box, vendor filter, sort order |
//! | [`LoginPage`] | open, dropdown selection, submit, logout |
//! | [`CheckoutPage`] | shipping form, submit, receipt download |
//!
//! # Example
//!
//! ```no_run
//! use resilient_ui::storefront::{CartPage, ProductPage};
//! use resilient_ui::{BrowserOptions, Engine, Result, W3cDriver, WebDriver};
//!
//! # async fn example() -> Result<()> {
//! let driver = W3cDriver::connect("http://localhost:4444", &BrowserOptions::default()).await?;
//! driver.navigate("https://bstackdemo.com/").await?;
//! let engine = Engine::new(&driver);
//!
//! ProductPage::new(engine.clone()).add_to_cart_by_name("iPhone 12").await;
//! let outcome = CartPage::new(engine).increase_quantity("iPhone 12", 2).await;
//! if outcome.is_soft_fail() {
//!     eprintln!("clicked, but the cart never showed the new quantity");
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// The floating cart.
pub mod cart;

/// The shipping step of checkout.
pub mod checkout;

/// The sign-in modal.
pub mod login;

/// The product shelf.
pub mod product;

/// Header search, vendor filters and sort order.
pub mod search;

/// Locator strategy lists.
pub mod targets;

// ============================================================================
// Re-exports
// ============================================================================

pub use cart::{CartPage, QuantityObservation};
pub use checkout::{CheckoutPage, Confirmation, ShippingDetails};
pub use login::LoginPage;
pub use product::{AddObservation, ProductPage};
pub use search::SearchPage;
