//! Catalog page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use tracing::instrument;

use crate::catalog::{SortMode, filter_catalog};
use crate::routes::cart::{CartView, order_totals};
use crate::routes::products::{CatalogParams, ProductView};
use crate::services::AddressForm;
use crate::state::AppState;

/// A `<select>` option.
#[derive(Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

const SORT_LABELS: [(SortMode, &str); 4] = [
    (SortMode::None, "Relevância"),
    (SortMode::PriceAsc, "Menor preço"),
    (SortMode::PriceDesc, "Maior preço"),
    (SortMode::NameAsc, "Nome (A-Z)"),
];

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/index.html")]
pub struct CatalogTemplate {
    pub products: Vec<ProductView>,
    pub term: String,
    pub categories: Vec<SelectOption>,
    pub sorts: Vec<SelectOption>,
    pub cart: CartView,
    pub address: AddressForm,
}

/// Display the catalog page, filtered and sorted by the query string.
#[instrument(skip(state))]
pub async fn home(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> CatalogTemplate {
    let query = params.query();
    let products = filter_catalog(state.catalog(), &query)
        .iter()
        .map(ProductView::from)
        .collect();

    let categories = state
        .categories()
        .iter()
        .map(|c| SelectOption {
            value: c.clone(),
            label: c.clone(),
            selected: *c == query.category,
        })
        .collect();

    let sorts = SORT_LABELS
        .iter()
        .map(|(mode, label)| SelectOption {
            value: mode.as_str().to_owned(),
            label: (*label).to_owned(),
            selected: *mode == query.sort,
        })
        .collect();

    let cart = {
        let cart = state.cart().lock().await;
        CartView::new(&cart, &order_totals(&state, cart.subtotal()))
    };

    CatalogTemplate {
        products,
        term: query.term,
        categories,
        sorts,
        cart,
        address: state.address().form(),
    }
}
