//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use noscope_core::{Product, ProductId};

use crate::catalog::{CatalogQuery, filter_catalog, find_product};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub category: String,
    pub image: String,
    pub images: Vec<String>,
    pub description: String,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.display(),
            category: product.category.clone(),
            image: product.primary_image().to_owned(),
            images: product.images.clone(),
            description: product.description.clone(),
        }
    }
}

/// Catalog filter query parameters (`?q=&category=&sort=`).
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub q: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
}

impl CatalogParams {
    #[must_use]
    pub fn query(&self) -> CatalogQuery {
        CatalogQuery::from_params(
            self.q.as_deref(),
            self.category.as_deref(),
            self.sort.as_deref(),
        )
    }
}

/// Product detail fragment shown in the modal.
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_detail.html")]
pub struct ProductDetailTemplate {
    pub product: ProductView,
}

/// Resolve a product id from a path or form field.
pub(crate) fn lookup<'a>(state: &'a AppState, raw: &str) -> Result<&'a Product> {
    let id = ProductId::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))?;
    find_product(state.catalog(), &id).ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Display the product detail fragment.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ProductDetailTemplate> {
    let product = lookup(&state, &id)?;
    Ok(ProductDetailTemplate {
        product: ProductView::from(product),
    })
}

/// Filtered catalog as JSON.
#[instrument(skip(state))]
pub async fn api_index(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Json<Vec<Product>> {
    Json(filter_catalog(state.catalog(), &params.query()))
}

/// Category list as JSON.
#[instrument(skip(state))]
pub async fn api_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.categories().to_vec())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use noscope_core::Price;

    use super::*;

    #[test]
    fn test_detail_renders_every_image() {
        let product = Product {
            id: ProductId::new("p9"),
            name: "Mousepad XL".to_string(),
            price: Price::from_cents(7_990),
            category: "Periféricos".to_string(),
            images: vec![
                "/static/images/mousepad-front.png".to_string(),
                "/static/images/mousepad-back.png".to_string(),
            ],
            description: String::new(),
        };
        let html = ProductDetailTemplate {
            product: ProductView::from(&product),
        }
        .render()
        .unwrap();

        assert!(html.contains("mousepad-front.png"));
        assert!(html.contains("mousepad-back.png"));
    }
}
