//! Domain validation errors.

use thiserror::Error;

/// Why an inbound order failed its validity predicate.
///
/// Validation failures are local and non-retryable; the caller surfaces
/// them immediately instead of redelivering the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid order data: order identity is missing")]
    MissingOrderId,

    #[error("Invalid order data: customer identity is missing")]
    MissingCustomerId,

    #[error("Invalid order data: order has no items")]
    NoItems,

    #[error("Invalid order data: item {index} is invalid")]
    InvalidItem { index: usize },
}
