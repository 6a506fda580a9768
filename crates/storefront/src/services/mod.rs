//! Clients for external services.
//!
//! # Services
//!
//! - `address` - CEP address lookup (`ViaCEP`) and the checkout address form

pub mod address;

pub use address::{AddressClient, AddressForm, AddressLookup, LookupOutcome};
