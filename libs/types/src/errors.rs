//! Error taxonomy for the exchange core
//!
//! Every rejection a caller can see maps to one of these variants. The
//! gateway translates them to HTTP statuses; the core never retries.

use crate::ids::OrderId;
use thiserror::Error;

/// Top-level exchange error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("order not found: {0}")]
    NotFound(OrderId),

    #[error("order {0} belongs to another account")]
    NotOwner(OrderId),

    #[error("order {0} is already in a terminal state")]
    NotCancellable(OrderId),

    #[error("order {0} cannot be amended")]
    NotAmendable(OrderId),

    /// The core detected an internal invariant violation and refuses
    /// further writes. Recovery requires a restart.
    #[error("exchange halted after an internal invariant violation")]
    Halted,
}

/// Input validation failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("price {price} is not a multiple of the tick size {tick}")]
    TickAlignment { price: String, tick: String },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: String, available: String },

    #[error("invalid amend: {0}")]
    InvalidAmend(String),
}
