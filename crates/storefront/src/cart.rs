//! Shopper cart.
//!
//! The cart is an ordered list of line items, unique by product id, that is
//! written to the key-value store after every mutation and announced to
//! subscribers through a `watch` channel so views can refresh.
//!
//! # Persisted format
//!
//! The cart lives under the [`CART_KEY`] key as a versioned document with one
//! entry per product:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "items": {
//!     "p1": { "position": 0, "name": "Combo Gamer", "price": "4000.00", "image": "...", "quantity": 2 }
//!   }
//! }
//! ```
//!
//! `position` keeps insertion order. Older installs stored a bare JSON array
//! of `{id, name, price, qty, image}`; that layout is still read and is
//! rewritten in the current schema on the next mutation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use noscope_core::{CartLineItem, Price, Product, ProductId};

use crate::store::kv::{KeyValueStore, get_json, set_json};
use crate::store::StoreError;

/// Store key holding the cart document.
pub const CART_KEY: &str = "cart";

/// Current persisted schema version.
pub const CART_SCHEMA_VERSION: u32 = 1;

/// Errors from cart persistence.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("cart storage error: {0}")]
    Store(#[from] StoreError),
}

/// Point-in-time view of the cart, published after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLineItem>,
    pub item_count: u32,
    pub subtotal: Price,
}

impl CartSummary {
    fn of(items: &[CartLineItem]) -> Self {
        Self {
            items: items.to_vec(),
            item_count: count(items),
            subtotal: subtotal(items),
        }
    }
}

/// The shopper's cart.
pub struct Cart {
    store: Arc<dyn KeyValueStore>,
    items: Vec<CartLineItem>,
    refresh: watch::Sender<CartSummary>,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart").field("items", &self.items).finish_non_exhaustive()
    }
}

impl Cart {
    /// Load the cart from `store`, starting empty when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the stored document cannot be read, is not valid
    /// JSON, or was written by a newer schema.
    #[instrument(skip(store))]
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self, CartError> {
        let items = match get_json::<StoredCart>(store.as_ref(), CART_KEY)? {
            Some(StoredCart::Versioned(doc)) => doc.into_items()?,
            Some(StoredCart::Legacy(lines)) => {
                debug!(lines = lines.len(), "Migrating legacy cart layout");
                migrate_legacy(lines)
            }
            None => Vec::new(),
        };

        let (refresh, _) = watch::channel(CartSummary::of(&items));
        Ok(Self {
            store,
            items,
            refresh,
        })
    }

    /// Add `quantity` units of `product`.
    ///
    /// An existing line for the product has its quantity increased; otherwise
    /// a new line snapshots the product's name, price and first image. Adding
    /// zero units changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be persisted.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if quantity > 0 {
            match self.items.iter_mut().find(|i| i.product_id == product.id) {
                Some(line) => line.quantity = line.quantity.saturating_add(quantity),
                None => self.items.push(CartLineItem::snapshot(product, quantity)),
            }
        }
        self.save()
    }

    /// Set the absolute quantity for a product. A quantity of zero or less
    /// removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be persisted.
    pub fn update_qty(&mut self, product_id: &ProductId, quantity: i64) -> Result<(), CartError> {
        match u32::try_from(quantity) {
            Ok(q) if q > 0 => {
                if let Some(line) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
                    line.quantity = q;
                }
            }
            Ok(_) => self.items.retain(|i| &i.product_id != product_id),
            // Negative quantities remove; anything above u32::MAX saturates.
            Err(_) if quantity < 0 => self.items.retain(|i| &i.product_id != product_id),
            Err(_) => {
                if let Some(line) = self.items.iter_mut().find(|i| &i.product_id == product_id) {
                    line.quantity = u32::MAX;
                }
            }
        }
        self.save()
    }

    /// Remove the line for a product, if any.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be persisted.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<(), CartError> {
        self.items.retain(|i| &i.product_id != product_id);
        self.save()
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.items.clear();
        self.save()
    }

    /// Sum of price × quantity over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        subtotal(&self.items)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        count(&self.items)
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::of(&self.items)
    }

    /// Subscribe to the summary published after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSummary> {
        self.refresh.subscribe()
    }

    fn save(&self) -> Result<(), CartError> {
        set_json(self.store.as_ref(), CART_KEY, &CartDocument::from_items(&self.items))?;
        self.refresh.send_replace(self.summary());
        Ok(())
    }
}

fn subtotal(items: &[CartLineItem]) -> Price {
    items.iter().map(CartLineItem::line_total).sum()
}

fn count(items: &[CartLineItem]) -> u32 {
    items
        .iter()
        .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
}

// =============================================================================
// Persisted layout
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredCart {
    Versioned(CartDocument),
    Legacy(Vec<LegacyLine>),
}

#[derive(Debug, Serialize, Deserialize)]
struct CartDocument {
    schema_version: u32,
    items: BTreeMap<ProductId, StoredLine>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredLine {
    position: u32,
    name: String,
    price: Price,
    #[serde(default)]
    image: String,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct LegacyLine {
    id: ProductId,
    name: String,
    price: Price,
    qty: i64,
    #[serde(default)]
    image: Option<String>,
}

impl CartDocument {
    fn from_items(items: &[CartLineItem]) -> Self {
        let items = items
            .iter()
            .zip(0u32..)
            .map(|(item, position)| {
                (
                    item.product_id.clone(),
                    StoredLine {
                        position,
                        name: item.name.clone(),
                        price: item.price,
                        image: item.image.clone(),
                        quantity: i64::from(item.quantity),
                    },
                )
            })
            .collect();

        Self {
            schema_version: CART_SCHEMA_VERSION,
            items,
        }
    }

    fn into_items(self) -> Result<Vec<CartLineItem>, StoreError> {
        if self.schema_version > CART_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: self.schema_version,
                supported: CART_SCHEMA_VERSION,
            });
        }

        let mut lines: Vec<(u32, CartLineItem)> = self
            .items
            .into_iter()
            .filter_map(|(product_id, line)| {
                let quantity = stored_quantity(&product_id, line.quantity)?;
                Some((
                    line.position,
                    CartLineItem {
                        product_id,
                        name: line.name,
                        price: line.price,
                        image: line.image,
                        quantity,
                    },
                ))
            })
            .collect();
        lines.sort_by_key(|(position, _)| *position);
        Ok(lines.into_iter().map(|(_, item)| item).collect())
    }
}

fn migrate_legacy(lines: Vec<LegacyLine>) -> Vec<CartLineItem> {
    let mut items: Vec<CartLineItem> = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(quantity) = stored_quantity(&line.id, line.qty) else {
            continue;
        };
        if let Some(existing) = items.iter_mut().find(|i| i.product_id == line.id) {
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            items.push(CartLineItem {
                product_id: line.id,
                name: line.name,
                price: line.price,
                image: line.image.unwrap_or_default(),
                quantity,
            });
        }
    }
    items
}

/// Quantity to keep for a stored line, or `None` if the line must be dropped.
fn stored_quantity(product_id: &ProductId, quantity: i64) -> Option<u32> {
    if quantity <= 0 {
        warn!(%product_id, quantity, "Dropping stored cart line with non-positive quantity");
        return None;
    }
    Some(u32::try_from(quantity).unwrap_or(u32::MAX))
}
