//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

use noscope_core::Product;

use crate::cart::{Cart, CartError, CartSummary};
use crate::catalog::{categories, static_catalog};
use crate::config::StorefrontConfig;
use crate::services::address::{AddressClient, AddressError, AddressLookup};
use crate::store::{FileStore, KeyValueStore, ProductStore, StoreError, load_catalog};

/// Error building application state at startup.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("storage unavailable: {0}")]
    Store(#[from] StoreError),
    #[error("cart could not be loaded: {0}")]
    Cart(#[from] CartError),
    #[error("address lookup client: {0}")]
    Address(#[from] AddressError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// catalog, the shopper's cart and the address lookup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    catalog: Vec<Product>,
    categories: Vec<String>,
    cart: Mutex<Cart>,
    products: ProductStore,
    address: AddressLookup,
}

impl AppState {
    /// Open local storage, reconcile the product cache and load the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory is unusable, the stored cart is
    /// unreadable, or the HTTP client cannot be built.
    pub async fn initialize(config: StorefrontConfig) -> Result<Self, InitError> {
        let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
        let cart = Cart::load(kv)?;
        tokio::spawn(log_cart_changes(cart.subscribe()));

        let products = ProductStore::new(&config.data_dir);
        let catalog = load_catalog(&products, &static_catalog(), config.catalog_policy).await?;
        let categories = categories(&catalog);

        let address = AddressLookup::new(AddressClient::new(&config.address)?);

        info!(
            products = catalog.len(),
            cart_items = cart.item_count(),
            data_dir = %config.data_dir.display(),
            "Application state initialized"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                catalog,
                categories,
                cart: Mutex::new(cart),
                products,
                address,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Products offered for sale, as loaded at startup.
    #[must_use]
    pub fn catalog(&self) -> &[Product] {
        &self.inner.catalog
    }

    /// Distinct categories in catalog order.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.inner.categories
    }

    /// The shopper's cart. Hold the guard for the whole mutation.
    #[must_use]
    pub fn cart(&self) -> &Mutex<Cart> {
        &self.inner.cart
    }

    /// The on-disk product cache.
    #[must_use]
    pub fn products(&self) -> &ProductStore {
        &self.inner.products
    }

    /// The checkout address form and its CEP lookup.
    #[must_use]
    pub fn address(&self) -> &AddressLookup {
        &self.inner.address
    }
}

/// Log every published cart change until the cart is dropped.
async fn log_cart_changes(mut rx: watch::Receiver<CartSummary>) {
    while rx.changed().await.is_ok() {
        let summary = rx.borrow_and_update();
        debug!(
            lines = summary.items.len(),
            item_count = summary.item_count,
            subtotal = %summary.subtotal,
            "Cart updated"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(dir: &std::path::Path) -> StorefrontConfig {
        let vars = HashMap::from([(
            "NOSCOPE_DATA_DIR".to_string(),
            dir.display().to_string(),
        )]);
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn test_initialize_seeds_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::initialize(config(dir.path())).await.unwrap();

        assert_eq!(state.catalog(), static_catalog().as_slice());
        assert_eq!(state.products().get().await.unwrap().len(), 5);
        assert!(state.cart().lock().await.is_empty());
        assert_eq!(state.categories().len(), 3);
    }

    #[tokio::test]
    async fn test_initialize_fails_when_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = dir.path().join("not-a-dir");
        std::fs::write(&blocked, "x").unwrap();

        let result = AppState::initialize(config(&blocked)).await;
        assert!(matches!(result, Err(InitError::Store(_))));
    }
}
