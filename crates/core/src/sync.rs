//! Guest Cart Sync Outcomes
//!
//! After login the guest entries are merged into the customer's cart in one
//! batch. The server applies what it can and reports the rest as failures.

use crate::{carts::Cart, entries::GuestCartEntry};

/// Structured code for a product that no longer exists.
pub const PRODUCT_NOT_FOUND_CODE: &str = "PRODUCT_NOT_FOUND";

/// Structured code for an entry that exceeds available stock.
pub const INSUFFICIENT_STOCK_CODE: &str = "INSUFFICIENT_STOCK";

/// Why an entry could not be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncFailureReason {
    /// The product was deleted
    ProductNotFound,

    /// Not enough stock for the requested quantity
    InsufficientStock,

    /// Anything else
    Other,
}

impl SyncFailureReason {
    /// Classify a failure, preferring the structured code over the free-text reason.
    pub fn classify(code: Option<&str>, reason: &str) -> Self {
        match code {
            Some(PRODUCT_NOT_FOUND_CODE) => return Self::ProductNotFound,
            Some(INSUFFICIENT_STOCK_CODE) => return Self::InsufficientStock,
            Some(_) | None => {}
        }

        let reason = reason.to_lowercase();

        if reason.contains("not found") {
            Self::ProductNotFound
        } else if reason.contains("stock") {
            Self::InsufficientStock
        } else {
            Self::Other
        }
    }
}

/// One entry the server could not merge.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncFailure {
    /// The entry as sent
    pub item: GuestCartEntry,

    /// Classified reason
    pub reason: SyncFailureReason,

    /// Server-provided description
    pub message: String,
}

/// Result of merging guest entries into the customer's cart.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// Number of entries applied
    pub synced: u32,

    /// Entries that could not be applied
    pub failed: Vec<SyncFailure>,

    /// The customer's cart after the merge
    pub cart: Cart,
}

/// Why every entry failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// Every product was deleted
    ProductsGone,

    /// Every product sold out
    SoldOut,

    /// Any other combination
    Mixed,
}

/// Classification of a [`SyncOutcome`] into disjoint cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSummary {
    /// Nothing was sent or nothing was reported
    Empty,

    /// Every entry was applied
    AllSynced {
        /// Entries applied
        synced: u32,
    },

    /// No entry was applied
    AllFailed {
        /// Entries rejected
        failed: usize,

        /// Shared cause, if any
        cause: FailureCause,
    },

    /// Some entries were applied, others rejected
    Partial {
        /// Entries applied
        synced: u32,

        /// Entries rejected
        failed: usize,

        /// Rejected because the product was deleted
        deleted: usize,

        /// Rejected for lack of stock
        out_of_stock: usize,
    },
}

impl SyncOutcome {
    /// Classify this outcome.
    pub fn summary(&self) -> SyncSummary {
        let failed = self.failed.len();

        match (self.synced, failed) {
            (0, 0) => SyncSummary::Empty,
            (synced, 0) => SyncSummary::AllSynced { synced },
            (0, failed) => SyncSummary::AllFailed {
                failed,
                cause: self.shared_cause(),
            },
            (synced, failed) => SyncSummary::Partial {
                synced,
                failed,
                deleted: self.count(SyncFailureReason::ProductNotFound),
                out_of_stock: self.count(SyncFailureReason::InsufficientStock),
            },
        }
    }

    fn count(&self, reason: SyncFailureReason) -> usize {
        self.failed
            .iter()
            .filter(|failure| failure.reason == reason)
            .count()
    }

    fn shared_cause(&self) -> FailureCause {
        let all = |reason| self.failed.iter().all(|failure| failure.reason == reason);

        if all(SyncFailureReason::ProductNotFound) {
            FailureCause::ProductsGone
        } else if all(SyncFailureReason::InsufficientStock) {
            FailureCause::SoldOut
        } else {
            FailureCause::Mixed
        }
    }
}
