//! Noscope Core - Shared types library.
//!
//! This crate provides the domain types used by the storefront:
//! - `storefront` - Catalog, cart, checkout and address lookup
//! - `integration-tests` - Router-level tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, postal codes, and
//!   the catalog/cart records built on them

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
