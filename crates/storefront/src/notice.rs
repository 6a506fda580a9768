//! Toast notices returned to the page after an action.

use serde::Serialize;

/// Notice severity; selects the toast style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A short message for the shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// Notice shown after a product is added to the cart.
    #[must_use]
    pub fn added_to_cart(product_name: &str) -> Self {
        Self::success(format!("{product_name} adicionado ao carrinho."))
    }
}
