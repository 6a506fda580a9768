//! Checkout route handler.

use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Serialize;
use tracing::instrument;

use crate::checkout::{CheckoutError, CheckoutForm, MSG_EMPTY_CART, checkout};
use crate::error::{Result, add_breadcrumb};
use crate::notice::Notice;
use crate::routes::cart::CART_UPDATED;
use crate::shipping::OrderTotals;
use crate::state::AppState;

/// Checkout response body.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    #[serde(flatten)]
    pub notice: Notice,
    pub totals: Option<OrderTotals>,
}

/// Place the order.
///
/// An empty cart answers 400 with an error notice; a placed order answers
/// with a success notice and the totals that were charged.
#[instrument(skip(state))]
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let mut cart = state.cart().lock().await;

    match checkout(&mut cart, &form, &state.config().shipping) {
        Ok(receipt) => {
            add_breadcrumb("checkout", "Order placed", None);
            Ok((
                AppendHeaders([CART_UPDATED]),
                Json(CheckoutResponse {
                    notice: receipt.notice,
                    totals: Some(receipt.totals),
                }),
            )
                .into_response())
        }
        Err(CheckoutError::EmptyCart) => Ok((
            StatusCode::BAD_REQUEST,
            Json(CheckoutResponse {
                notice: Notice::error(MSG_EMPTY_CART),
                totals: None,
            }),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}
