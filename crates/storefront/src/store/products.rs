//! Persistent product cache.
//!
//! A mirror of the catalog keyed by product id, stored as a single JSON
//! object in `products.json`. The cache never evicts or expires entries;
//! whether startup refreshes it is decided by [`CatalogPolicy`].

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use noscope_core::{Product, ProductId};

use super::StoreError;

const PRODUCTS_FILE: &str = "products.json";

/// How the cache is reconciled with the static catalog on startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogPolicy {
    /// Seed the cache only when it is empty; otherwise serve cached data
    /// verbatim, even if the static catalog has changed since.
    #[default]
    SeedIfEmpty,
    /// Treat the static catalog as authoritative and rewrite the cache on
    /// every start.
    AlwaysRefresh,
}

impl CatalogPolicy {
    /// Parse a policy name (`seed-if-empty` or `always-refresh`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed-if-empty" => Some(Self::SeedIfEmpty),
            "always-refresh" => Some(Self::AlwaysRefresh),
            _ => None,
        }
    }
}

/// File-backed product cache.
#[derive(Debug)]
pub struct ProductStore {
    path: PathBuf,
    initialized: AtomicBool,
    write_lock: Mutex<()>,
}

impl ProductStore {
    /// Create a handle for the cache in `data_dir`. No I/O happens until
    /// [`init`](Self::init).
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(PRODUCTS_FILE),
            initialized: AtomicBool::new(false),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the store, creating the directory and an empty cache file if they
    /// do not exist. Calling `init` again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the storage is unavailable.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn init(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StoreError::io(dir, e))?;
        }

        match tokio::fs::metadata(&self.path).await {
            Ok(_) => debug!("Product cache already present"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tokio::fs::write(&self.path, "{}")
                    .await
                    .map_err(|e| StoreError::io(&self.path, e))?;
                info!("Created empty product cache");
            }
            Err(e) => return Err(StoreError::io(&self.path, e)),
        }

        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Upsert every product, keyed by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotInitialized` before `init`, or an I/O or
    /// serialization error.
    #[instrument(skip(self, products), fields(count = products.len()))]
    pub async fn set(&self, products: &[Product]) -> Result<(), StoreError> {
        self.ensure_initialized()?;
        let _guard = self.write_lock.lock().await;

        let mut entries = self.read_entries().await?;
        for product in products {
            entries.insert(product.id.clone(), product.clone());
        }

        let raw = serde_json::to_string_pretty(&entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, raw)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }

    /// All cached products ordered by id, or an empty list.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotInitialized` before `init`, or an I/O or
    /// serialization error.
    pub async fn get(&self) -> Result<Vec<Product>, StoreError> {
        self.ensure_initialized()?;
        Ok(self.read_entries().await?.into_values().collect())
    }

    fn ensure_initialized(&self) -> Result<(), StoreError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    async fn read_entries(&self) -> Result<BTreeMap<ProductId, Product>, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Open the cache and return the catalog the storefront should serve.
///
/// With [`CatalogPolicy::SeedIfEmpty`] an empty cache is seeded from
/// `catalog` and a non-empty one is returned as is. With
/// [`CatalogPolicy::AlwaysRefresh`] the cache is overwritten and `catalog`
/// is returned.
///
/// # Errors
///
/// Returns `StoreError` if the cache cannot be opened, read or written.
#[instrument(skip(store, catalog))]
pub async fn load_catalog(
    store: &ProductStore,
    catalog: &[Product],
    policy: CatalogPolicy,
) -> Result<Vec<Product>, StoreError> {
    store.init().await?;

    match policy {
        CatalogPolicy::SeedIfEmpty => {
            let cached = store.get().await?;
            if cached.is_empty() {
                info!(count = catalog.len(), "Seeding product cache from catalog");
                store.set(catalog).await?;
                Ok(catalog.to_vec())
            } else {
                debug!(count = cached.len(), "Serving products from cache");
                Ok(cached)
            }
        }
        CatalogPolicy::AlwaysRefresh => {
            info!(count = catalog.len(), "Refreshing product cache from catalog");
            store.set(catalog).await?;
            Ok(catalog.to_vec())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use noscope_core::Price;

    use super::*;
    use crate::catalog::static_catalog;

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            price: Price::from_cents(1_000),
            category: "Teste".to_string(),
            images: Vec::new(),
            description: String::new(),
        }
    }

    #[tokio::test]
    async fn test_get_before_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path());
        assert!(matches!(
            store.get().await,
            Err(StoreError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path());
        store.init().await.unwrap();
        store.set(&[product("p1", "Um")]).await.unwrap();
        store.init().await.unwrap();
        assert_eq!(store.get().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_overwrites_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path());
        store.init().await.unwrap();

        store
            .set(&[product("p1", "Antigo"), product("p2", "Dois")])
            .await
            .unwrap();
        store.set(&[product("p1", "Novo")]).await.unwrap();

        let products = store.get().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Novo");
        assert_eq!(products[1].name, "Dois");
    }

    #[tokio::test]
    async fn test_seed_if_empty_seeds_full_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path());
        let catalog = static_catalog();

        let loaded = load_catalog(&store, &catalog, CatalogPolicy::SeedIfEmpty)
            .await
            .unwrap();
        assert_eq!(loaded, catalog);

        let mut cached = store.get().await.unwrap();
        let mut expected = catalog.clone();
        cached.sort_by(|a, b| a.id.cmp(&b.id));
        expected.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(cached, expected);
    }

    #[tokio::test]
    async fn test_seed_if_empty_keeps_existing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path());
        store.init().await.unwrap();
        store.set(&[product("x1", "Em cache")]).await.unwrap();

        let loaded = load_catalog(&store, &static_catalog(), CatalogPolicy::SeedIfEmpty)
            .await
            .unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Em cache");
    }

    #[tokio::test]
    async fn test_always_refresh_rewrites_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProductStore::new(dir.path());
        store.init().await.unwrap();
        let stale = product("p1", "Nome antigo");
        store.set(&[stale]).await.unwrap();

        let catalog = static_catalog();
        let loaded = load_catalog(&store, &catalog, CatalogPolicy::AlwaysRefresh)
            .await
            .unwrap();
        assert_eq!(loaded, catalog);

        let cached = store.get().await.unwrap();
        let p1 = cached.iter().find(|p| p.id.as_str() == "p1").unwrap();
        assert_eq!(p1.name, "Combo Gamer");
    }

    #[tokio::test]
    async fn test_init_fails_when_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the data directory should be.
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "x").unwrap();

        let store = ProductStore::new(&blocker.join("data"));
        assert!(matches!(store.init().await, Err(StoreError::Io { .. })));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            CatalogPolicy::parse("seed-if-empty"),
            Some(CatalogPolicy::SeedIfEmpty)
        );
        assert_eq!(
            CatalogPolicy::parse(" Always-Refresh "),
            Some(CatalogPolicy::AlwaysRefresh)
        );
        assert_eq!(CatalogPolicy::parse("never"), None);
    }
}
