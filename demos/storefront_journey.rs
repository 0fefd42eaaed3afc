//! End-to-end journey against the demo store.
//!
//! Demonstrates:
//! - Scoped session with guaranteed quit
//! - Login through custom dropdowns
//! - Search box, vendor filter and sort order
//! - Add to cart, quantity increase with subtotal fallback, removal
//! - Shipping form fill, order confirmation and receipt download
//! - Logout with account menu and home page fallbacks
//!
//! Requires a running chromedriver (or geckodriver with `--firefox`).
//!
//! Usage:
//!   cargo run --example storefront_journey
//!   cargo run --example storefront_journey -- --headless --debug
//!   cargo run --example storefront_journey -- --firefox --remote http://localhost:4444

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

use common::Args;
use resilient_ui::session::with_session;
use resilient_ui::storefront::{
    CartPage, CheckoutPage, LoginPage, ProductPage, SearchPage, ShippingDetails,
};
use resilient_ui::{
    Action, BrowserOptions, Engine, OperationOutcome, Result, Target, W3cDriver, WebDriver,
};

const STORE_URL: &str = "https://bstackdemo.com/";
const PRODUCT: &str = "iPhone 12";
const VENDOR: &str = "Apple";
const SORT_ORDER: &str = "Lowest to highest";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Storefront Journey ===\n");

    let mut options = if args.firefox {
        BrowserOptions::firefox()
    } else {
        BrowserOptions::chrome()
    }
    .with_window_size(1280, 900);
    let downloads: PathBuf = std::env::temp_dir().join("resilient-ui-receipts");
    options = options.with_download_dir(downloads.clone());
    if args.headless {
        options = options.with_headless();
    }
    options
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid browser options")?;

    println!("[Setup] Connecting to {}...", args.remote);
    let connect = W3cDriver::connect(&args.remote, &options);
    let failures = with_session(connect, async |driver: &W3cDriver| {
        journey(driver, &downloads).await
    })
    .await?;

    if failures > 0 {
        bail!("{failures} step(s) did not confirm");
    }
    println!("\n=== All steps confirmed ===");
    Ok(())
}

// ============================================================================
// Journey
// ============================================================================

/// Runs every step and returns how many were not confirmed.
async fn journey(driver: &W3cDriver, downloads: &Path) -> Result<usize> {
    driver.navigate(STORE_URL).await?;
    let engine = Engine::new(driver);
    let mut failures = 0;

    // ========================================================================
    // Login
    // ========================================================================

    let login = LoginPage::new(engine.clone())
        .login("demouser", "testingisfun99")
        .await;
    failures += report("Login", &login);

    // ========================================================================
    // Search & Filters
    // ========================================================================

    let search = SearchPage::new(engine.clone());
    failures += report("Search text", &search.enter_search("iPhone").await);
    println!("[Search] Search button: {:?}", search.submit_search().await);
    failures += report("Vendor filter", &search.apply_vendor_filter(VENDOR).await);
    failures += report("Sort order", &search.select_sort_order(SORT_ORDER).await);
    println!("        results: {:?}", search.product_titles().await);

    // ========================================================================
    // Cart
    // ========================================================================

    let added = ProductPage::new(engine.clone())
        .add_to_cart_by_name(PRODUCT)
        .await;
    failures += report("Add to cart", &added);

    let cart = CartPage::new(engine.clone());
    println!("        quantity before: {:?}", cart.quantity_for_item(PRODUCT).await);
    let increased = cart.increase_quantity(PRODUCT, 2).await;
    failures += report("Increase quantity", &increased);
    println!("        subtotal: {:?}", cart.subtotal().await);

    let removed = cart.remove_item(PRODUCT).await;
    failures += report("Remove item", &removed);

    // ========================================================================
    // Checkout
    // ========================================================================

    let re_added = ProductPage::new(engine.clone()).add_first_to_cart().await;
    failures += report("Add first product", &re_added);

    let opened = engine
        .resolve_and_act(&Target::new("checkout", "div.buy-btn"), &Action::Click, 1)
        .await;
    println!("[Checkout] Checkout button: {opened:?}");

    let checkout = CheckoutPage::new(engine.clone());
    let details = ShippingDetails {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        address: "12 St James Square".into(),
        province: "London".into(),
        postal_code: "SW1Y 4JH".into(),
    };
    let filled = checkout.fill_shipping(&details).await;
    println!(
        "[Checkout] {} field(s) filled, {} via fallback",
        filled.len(),
        filled.fallback_count()
    );
    let confirmed = checkout.submit().await;
    failures += report("Place order", &confirmed);

    let receipt = checkout.download_receipt(downloads).await;
    failures += report("Download receipt", &receipt);

    // ========================================================================
    // Logout
    // ========================================================================

    let logout = LoginPage::new(engine).logout(Some(STORE_URL)).await;
    failures += report("Logout", &logout);

    Ok(failures)
}

/// Prints one step's outcome; returns 1 if it was not confirmed.
fn report<T: std::fmt::Debug>(step: &str, outcome: &OperationOutcome<T>) -> usize {
    match outcome {
        OperationOutcome::Success { value, .. } => {
            println!("[{step}] ✓ {value:?}");
            0
        }
        other => {
            println!("[{step}] ✗ {other:?}");
            1
        }
    }
}
