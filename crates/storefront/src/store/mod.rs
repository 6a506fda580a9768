//! Local persistence for the storefront.
//!
//! # Stores
//!
//! - [`kv`] - Synchronous string key-value store. Holds the cart document
//!   under a single key, the same way a browser page would use local storage.
//! - [`products`] - Async product cache keyed by product id, seeded from the
//!   static catalog on first start.
//!
//! Both live under the configured data directory:
//!
//! ```text
//! data/
//! ├── cart.json       # key-value entry "cart"
//! └── products.json   # product cache
//! ```

pub mod kv;
pub mod products;

use std::path::PathBuf;

use thiserror::Error;

pub use kv::{FileStore, KeyValueStore, MemoryStore};
pub use products::{CatalogPolicy, ProductStore, load_catalog};

/// Errors from the local stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage could not be read or written.
    #[error("storage unavailable at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key contains characters that cannot be used as a file name.
    #[error("invalid store key: {0:?}")]
    InvalidKey(String),

    /// Stored document was written by a newer schema than this build reads.
    #[error("unsupported schema version {found} (latest supported is {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    /// The store was used before `init()`.
    #[error("store not initialized")]
    NotInitialized,
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
