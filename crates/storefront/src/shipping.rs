//! Shipping fee and order totals.

use serde::Serialize;

use noscope_core::{PostalCode, Price};

/// Flat-rate shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    /// Subtotals at or above this ship free.
    pub free_threshold: Price,
    /// Fee charged below the threshold.
    pub flat_fee: Price,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold: Price::from_cents(50_000),
            flat_fee: Price::from_cents(2_000),
        }
    }
}

impl ShippingPolicy {
    /// Shipping fee for a subtotal.
    #[must_use]
    pub fn fee(&self, subtotal: Price) -> Price {
        if subtotal >= self.free_threshold {
            Price::ZERO
        } else {
            self.flat_fee
        }
    }
}

/// Subtotal, shipping and total shown in the cart panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
}

impl OrderTotals {
    /// Compute totals. Shipping is only charged once a complete postal code
    /// is known; until then it shows as zero.
    #[must_use]
    pub fn compute(
        subtotal: Price,
        postal_code: Option<&PostalCode>,
        policy: &ShippingPolicy,
    ) -> Self {
        let shipping = postal_code.map_or(Price::ZERO, |_| policy.fee(subtotal));
        Self {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}
