//! Pawcart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    carts::{Cart, CartOwner},
    entries::{EntrySetFingerprint, GuestCartEntry, GuestEntries},
    ids::{CustomerId, TypedId},
    items::{LineItem, LineItemId, ProductSnapshot},
    pricing::{TaxRate, Totals},
    products::{ONE_SIZE, Product, ProductId, Size},
    quantity::{MAX_QTY, MIN_QTY, QuantityBounds},
    sync::{FailureCause, SyncFailure, SyncFailureReason, SyncOutcome, SyncSummary},
};
