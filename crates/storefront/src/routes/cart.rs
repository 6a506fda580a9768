//! Cart route handlers.
//!
//! Mutations answer with the fragment the page swaps in plus an
//! `HX-Trigger: cart-updated` header, which tells the page to refresh the
//! badge and the cart panel.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use noscope_core::{CartLineItem, Price, ProductId};

use crate::cart::Cart;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::notice::Notice;
use crate::routes::products::lookup;
use crate::shipping::OrderTotals;
use crate::state::AppState;

/// Header and event name announcing a cart change.
pub const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&CartLineItem> for CartItemView {
    fn from(item: &CartLineItem) -> Self {
        Self {
            id: item.product_id.to_string(),
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            price: item.price.display(),
            line_price: item.line_total().display(),
        }
    }
}

/// Cart panel display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, totals: &OrderTotals) -> Self {
        Self {
            items: cart.items().iter().map(CartItemView::from).collect(),
            item_count: cart.item_count(),
            subtotal: totals.subtotal.display(),
            shipping: totals.shipping.display(),
            total: totals.total.display(),
        }
    }
}

/// Totals for `subtotal`, charging shipping once the address form holds a
/// complete postal code.
pub(crate) fn order_totals(state: &AppState, subtotal: Price) -> OrderTotals {
    let postal_code = state.address().form().complete_postal_code();
    OrderTotals::compute(subtotal, postal_code.as_ref(), &state.config().shipping)
}

fn cart_view(state: &AppState, cart: &Cart) -> CartView {
    CartView::new(cart, &order_totals(state, cart.subtotal()))
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    #[serde(default)]
    pub quantity: String,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Quantity typed into a cart line.
///
/// Reads the leading integer and ignores the rest, so `"2.5"` is 2 and
/// `"3abc"` is 3. Blank, unparsable and zero input count as 1; negative
/// input removes the line.
fn typed_quantity(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    let magnitude = match rest[..digits].parse::<i64>() {
        Ok(q) => q,
        Err(_) if digits > 0 => i64::MAX,
        Err(_) => return 1,
    };
    match if negative { -magnitude } else { magnitude } {
        0 => 1,
        q => q,
    }
}

/// Cart items fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Cart summary JSON.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartLineItem>,
    pub count: u32,
    pub subtotal: Price,
    pub totals: OrderTotals,
}

/// Display the cart panel fragment.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> CartItemsTemplate {
    let cart = state.cart().lock().await;
    CartItemsTemplate {
        cart: cart_view(&state, &cart),
    }
}

/// Cart count badge fragment.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> CartCountTemplate {
    CartCountTemplate {
        count: state.cart().lock().await.item_count(),
    }
}

/// Add a product to the cart.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = lookup(&state, &form.product_id)?;
    let quantity = form
        .quantity
        .as_deref()
        .and_then(|q| u32::try_from(typed_quantity(q)).ok())
        .filter(|q| *q > 0)
        .unwrap_or(1);

    state.cart().lock().await.add(product, quantity)?;
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product.id.as_str())]));

    Ok((
        AppendHeaders([CART_UPDATED]),
        Json(Notice::added_to_cart(&product.name)),
    )
        .into_response())
}

/// Set the quantity of a cart line.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let id = parse_id(&form.product_id)?;
    let mut cart = state.cart().lock().await;
    cart.update_qty(&id, typed_quantity(&form.quantity))?;

    Ok((
        AppendHeaders([CART_UPDATED]),
        CartItemsTemplate {
            cart: cart_view(&state, &cart),
        },
    )
        .into_response())
}

/// Remove a line from the cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let id = parse_id(&form.product_id)?;
    let mut cart = state.cart().lock().await;
    cart.remove(&id)?;

    Ok((
        AppendHeaders([CART_UPDATED]),
        CartItemsTemplate {
            cart: cart_view(&state, &cart),
        },
    )
        .into_response())
}

/// Cart summary as JSON.
#[instrument(skip(state))]
pub async fn api_show(State(state): State<AppState>) -> Json<CartResponse> {
    let cart = state.cart().lock().await;
    let subtotal = cart.subtotal();
    Json(CartResponse {
        items: cart.items().to_vec(),
        count: cart.item_count(),
        subtotal,
        totals: order_totals(&state, subtotal),
    })
}

fn parse_id(raw: &str) -> Result<ProductId> {
    ProductId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}
