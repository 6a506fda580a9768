//! Core types for Noscope.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod postal_code;
pub mod price;
pub mod product;

pub use id::{ProductId, ProductIdError};
pub use postal_code::{PostalCode, PostalCodeError, format_postal_code_input};
pub use price::{CurrencyCode, Price, PriceError};
pub use product::{CartLineItem, Product};
