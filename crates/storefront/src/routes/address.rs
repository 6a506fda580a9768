//! CEP lookup route handler.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::routes::cart::order_totals;
use crate::services::AddressForm;
use crate::shipping::OrderTotals;
use crate::state::AppState;

/// CEP lookup response body.
#[derive(Debug, Serialize)]
pub struct CepResponse {
    /// `skipped`, `found`, `not_found` or `failed`.
    pub outcome: &'static str,
    pub message: Option<&'static str>,
    /// False when a newer lookup finished first and this one was discarded.
    pub applied: bool,
    pub address: AddressForm,
    pub totals: OrderTotals,
}

/// Look up the address for a CEP typed into the checkout form.
///
/// Never fails: an incomplete CEP, an unknown CEP and an unreachable lookup
/// service are all reported through `outcome` so the shopper can fill the
/// address in by hand.
#[instrument(skip(state))]
pub async fn lookup(State(state): State<AppState>, Path(code): Path<String>) -> Json<CepResponse> {
    let report = state.address().lookup(&code).await;
    let subtotal = state.cart().lock().await.subtotal();

    Json(CepResponse {
        outcome: report.outcome.kind(),
        message: report.outcome.message(),
        applied: report.applied,
        address: report.form,
        totals: order_totals(&state, subtotal),
    })
}
