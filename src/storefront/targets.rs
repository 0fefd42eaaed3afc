//! Locator strategy lists for the demo store.
//!
//! Each function returns a fresh [`Target`]; strategies are listed from
//! most to least specific.

use crate::locator::{By, Strategy, Target, TextMatch};

/// Title elements inside a cart item, in priority order.
const CART_ITEM_TITLE: [&str; 3] = [
    ".shelf-item__details > p",
    ".shelf-item__title",
    ".shelf-item__details",
];

/// Title element inside a product card.
const PRODUCT_TITLE: &str = "p.shelf-item__title";

// ============================================================================
// Cart
// ============================================================================

/// The floating cart panel.
#[must_use]
pub fn cart_root() -> Target {
    Target::new("cart-root", "div.float-cart")
}

/// Every item row in the cart.
#[must_use]
pub fn cart_items() -> Target {
    Target::new("cart-items", "div.float-cart .shelf-item")
}

/// Cart rows whose title contains `name`.
#[must_use]
pub fn cart_item(name: &str) -> Target {
    cart_items().filtered(by_cart_title(TextMatch::contains(name)))
}

/// Cart rows whose title is exactly `title`.
#[must_use]
pub fn cart_item_titled(title: &str) -> Target {
    cart_items().filtered(by_cart_title(TextMatch::equals(title)))
}

/// Title inside a cart row.
#[must_use]
pub fn cart_item_title() -> Target {
    let [first, rest @ ..] = CART_ITEM_TITLE;
    rest.iter().fold(
        Target::new("cart-item-title", Strategy::css(first).first()),
        |target, css| target.or(Strategy::css(*css).first()),
    )
}

fn by_cart_title(filter: TextMatch) -> TextMatch {
    CART_ITEM_TITLE
        .iter()
        .fold(filter, |filter, css| filter.in_descendant(By::css(*css)))
}

/// Cart subtotal text.
#[must_use]
pub fn subtotal() -> Target {
    Target::new(
        "subtotal",
        Strategy::css("p.sub-price__val, .sub-price__val, .cart-subtotal, .subtotal").first(),
    )
    .or(Strategy::xpath(
        "//*[contains(text(),'SUBTOTAL') or contains(text(),'Subtotal') or contains(text(),'total')]",
    )
    .first())
}

/// The "+" control inside a cart row; the last button if none shows "+".
#[must_use]
pub fn plus_control() -> Target {
    const BUTTONS: &str = "button.change-product-button, .change-product-button, button";
    Target::new(
        "plus-control",
        Strategy::css(BUTTONS).containing("+").first(),
    )
    .or(Strategy::css(BUTTONS).last())
}

/// The remove control inside a cart row.
#[must_use]
pub fn remove_control() -> Target {
    Target::new(
        "remove-control",
        Strategy::css(".shelf-item__del").interactable().first(),
    )
    .or(Strategy::css(".shelf-item_del").interactable().first())
    .or(Strategy::css("button.remove, .remove").interactable().first())
    .or(Strategy::css(".item-remove").interactable().first())
    .or(Strategy::css("button").interactable().first())
    .or(Strategy::css("svg").first())
}

// ============================================================================
// Products
// ============================================================================

/// Product cards on the shelf, outside the cart.
#[must_use]
pub fn product_cards() -> Target {
    Target::new("product-cards", ".shelf-container div.shelf-item").or("div.shelf-item")
}

/// Product cards whose title contains `name`.
#[must_use]
pub fn product_card(name: &str) -> Target {
    product_cards().filtered(TextMatch::contains(name.trim()).in_descendant(By::css(PRODUCT_TITLE)))
}

/// Title inside a product card.
#[must_use]
pub fn product_title() -> Target {
    Target::new("product-title", Strategy::css(PRODUCT_TITLE).first())
}

/// "Add to cart" inside a product card.
#[must_use]
pub fn buy_button() -> Target {
    Target::new("buy-button", Strategy::css("div.shelf-item__buy-btn").first())
}

// ============================================================================
// Search & Filters
// ============================================================================

/// The header search box.
#[must_use]
pub fn search_box() -> Target {
    Target::new("search-box", Strategy::css("input[placeholder='Search']").first())
}

/// The header search button.
#[must_use]
pub fn search_button() -> Target {
    Target::new(
        "search-button",
        Strategy::xpath("//button[contains(text(),'Search')]").first(),
    )
    .or(Strategy::css("button").containing("Search").first())
}

/// Every product title in the result list.
#[must_use]
pub fn result_titles() -> Target {
    Target::new("result-titles", ".shelf-item__title, .product-title, .title")
}

/// The vendor filter label whose text (or inner span) is `vendor`.
#[must_use]
pub fn vendor_filter(vendor: &str) -> Target {
    let vendor = vendor.trim();
    let literal = crate::locator::selector::xpath_literal(vendor);
    Target::new(
        "vendor-filter",
        Strategy::xpath(format!(
            "//label[.//span[normalize-space()={literal}] or normalize-space(.)={literal}]"
        ))
        .first(),
    )
    .or(Strategy::css("label")
        .with_filter(TextMatch::equals(vendor).in_descendant(By::css("span")))
        .first())
}

/// The checkbox inside a vendor filter label.
#[must_use]
pub fn filter_checkbox() -> Target {
    Target::new("filter-checkbox", Strategy::css("input").first())
}

/// The sort order dropdown.
#[must_use]
pub fn sort_select() -> Target {
    Target::new("sort-select", Strategy::css(".sort select, select.sort").first())
}

/// Options inside the sort dropdown.
#[must_use]
pub fn sort_options() -> Target {
    Target::new("sort-options", "option")
}

/// The sort option whose text is `order`, ignoring case.
#[must_use]
pub fn sort_option(order: &str) -> Target {
    Target::new(
        "sort-option",
        Strategy::css("option")
            .with_filter(TextMatch::equals(order))
            .first(),
    )
}

// ============================================================================
// Login
// ============================================================================

/// The "Sign In" link.
#[must_use]
pub fn sign_in() -> Target {
    Target::new("sign-in", By::id("signin"))
}

/// The clickable control of the dropdown in `#container`.
#[must_use]
pub fn dropdown_control(container: &str) -> Target {
    Target::new(
        format!("{container}-control"),
        Strategy::css(format!("#{container} div.css-yk16xz-control")).first(),
    )
}

/// The selected value of the dropdown in `#container`.
#[must_use]
pub fn dropdown_value(container: &str) -> Target {
    Target::new(
        format!("{container}-value"),
        Strategy::css(format!("#{container} div.css-1uccc91-singleValue")).first(),
    )
}

/// The first option of the open dropdown containing `text`.
#[must_use]
pub fn dropdown_option(container: &str, text: &str) -> Target {
    let literal = crate::locator::selector::xpath_literal(text);
    Target::new(
        format!("{container}-option"),
        Strategy::xpath(format!(
            "//div[@id='{container}']//div[contains(normalize-space(.), {literal})]"
        ))
        .first(),
    )
    .or(Strategy::css(format!("#{container} div[id*='-option-']"))
        .containing(text)
        .first())
}

/// The login submit button.
#[must_use]
pub fn login_button() -> Target {
    Target::new("login-button", By::id("login-btn"))
}

/// Signed-in user name in the navigation bar.
#[must_use]
pub fn signed_in_user() -> Target {
    Target::new("signed-in-user", Strategy::css("span.username").first())
}

/// Logout controls, most specific first.
#[must_use]
pub fn logout_control() -> Target {
    Target::new(
        "logout",
        Strategy::xpath(
            "//*[text()='Logout' or text()='logout' or normalize-space(.)='Logout' or normalize-space(.)='logout']",
        ),
    )
    .or(By::id("logout"))
    .or("a.logout, button.logout, .logout-link, .btn-logout")
    .or(Strategy::xpath(
        "//a[contains(@href,'logout') or contains(@onclick,'logout')]",
    ))
}

/// Account menu that may hide the logout control.
#[must_use]
pub fn user_menu() -> Target {
    Target::new(
        "user-menu",
        Strategy::css(".nav-user, .user-menu, .dropdown-toggle, .profile-menu").first(),
    )
    .or(Strategy::xpath(
        "//*[contains(@class,'user') and (contains(.,'Account') or contains(.,'Profile'))]",
    )
    .first())
}

/// Sign-in controls shown once signed out.
#[must_use]
pub fn signed_out() -> Target {
    Target::new("signed-out", By::id("signin"))
        .or("a#signin, #login, .signin, input[value='Sign in']")
}

// ============================================================================
// Checkout
// ============================================================================

/// The shipping form container.
#[must_use]
pub fn checkout_form() -> Target {
    Target::new(
        "checkout-form",
        Strategy::css("div.checkout-form, div.checkout-view-content, #checkout-app").first(),
    )
}

/// A shipping input, by element id then by its label text.
#[must_use]
pub fn shipping_input(input_id: &str, label: &str) -> Target {
    let literal = crate::locator::selector::xpath_literal(label);
    Target::new(label.to_string(), By::id(input_id)).or(Strategy::xpath(format!(
        "//label[contains(normalize-space(.), {literal})]/following::input[1]"
    ))
    .first())
}

/// The shipping step submit button.
#[must_use]
pub fn shipping_submit() -> Target {
    Target::new(
        "shipping-submit",
        Strategy::css(
            "button#checkout-shipping-continue, button[type=submit].button--primary, button[type=submit]",
        )
        .first(),
    )
}

/// Proof on the page that an order went through.
#[must_use]
pub fn order_confirmation() -> Target {
    Target::new("order-confirmation", By::id("downloadpdf")).or(By::id("confirmation-message"))
}

/// The "Download order receipt" link on the confirmation page.
#[must_use]
pub fn download_pdf() -> Target {
    Target::new("download-pdf", By::id("downloadpdf"))
}
