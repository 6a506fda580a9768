//! Order checkout.
//!
//! Checkout is a confirmation step only: no order is stored and no payment is
//! taken. A non-empty cart is cleared and the shopper sees a success notice.

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument};

use noscope_core::PostalCode;

use crate::cart::{Cart, CartError};
use crate::notice::Notice;
use crate::shipping::{OrderTotals, ShippingPolicy};

/// Shown when checking out an empty cart.
pub const MSG_EMPTY_CART: &str = "Carrinho vazio.";
/// Shown after a successful checkout.
pub const MSG_ORDER_PLACED: &str = "Pedido finalizado com sucesso!";

/// Errors that can occur at checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Carrinho vazio.")]
    EmptyCart,

    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Address form submitted with the order. Fields are free text and may be
/// left blank.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub cep: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub neighborhood: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub uf: String,
}

impl CheckoutForm {
    /// The submitted postal code, if complete.
    #[must_use]
    pub fn postal_code(&self) -> Option<PostalCode> {
        PostalCode::parse(&self.cep).ok()
    }
}

/// A completed checkout.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub totals: OrderTotals,
    pub notice: Notice,
}

/// Place the order for everything in `cart` and empty it.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` if the cart has no items, or
/// `CheckoutError::Cart` if the emptied cart cannot be persisted.
#[instrument(skip(cart, form, policy), fields(items = cart.item_count()))]
pub fn checkout(
    cart: &mut Cart,
    form: &CheckoutForm,
    policy: &ShippingPolicy,
) -> Result<Receipt, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let postal_code = form.postal_code();
    let totals = OrderTotals::compute(cart.subtotal(), postal_code.as_ref(), policy);
    cart.clear()?;

    info!(
        cep = postal_code.as_ref().map_or("", PostalCode::as_str),
        total = %totals.total,
        "Order placed"
    );

    Ok(Receipt {
        totals,
        notice: Notice::success(MSG_ORDER_PLACED),
    })
}
