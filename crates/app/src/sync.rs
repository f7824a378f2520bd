//! Sync Engine
//!
//! Merges the guest cart into the customer's cart once per sign-in.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use pawcart::{
    ids::CustomerId,
    sync::{FailureCause, SyncSummary},
};
use tracing::{debug, info, instrument, warn};

use crate::{
    cache::{CartCache, CartKey},
    errors::{CartError, ErrorKind},
    gateway::CartGateway,
    local::LocalCartStore,
    notifications::{Level, Notification, Notifier, messages},
    session::AuthStatus,
};

/// Default pause between the combined partial-sync message and its breakdown.
pub const DEFAULT_BREAKDOWN_DELAY: Duration = Duration::from_millis(1_500);

/// What a sync pass did.
#[derive(Debug)]
pub enum SyncReport {
    /// Not a fresh sign-in, or nothing to merge.
    Skipped,

    /// The server merged the entries; some may have been rejected.
    Completed(SyncSummary),

    /// The call failed; the guest cart was kept.
    Failed(CartError),
}

pub struct SyncEngine {
    gateway: Arc<dyn CartGateway>,
    local: Arc<LocalCartStore>,
    cache: Arc<CartCache>,
    notifier: Arc<dyn Notifier>,
    breakdown_delay: Duration,
    fired: AtomicBool,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("breakdown_delay", &self.breakdown_delay)
            .field("fired", &self.fired)
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    pub fn new(
        gateway: Arc<dyn CartGateway>,
        local: Arc<LocalCartStore>,
        cache: Arc<CartCache>,
        notifier: Arc<dyn Notifier>,
        breakdown_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            local,
            cache,
            notifier,
            breakdown_delay,
            fired: AtomicBool::new(false),
        }
    }

    /// React to an authentication change.
    ///
    /// Runs a sync the first time the shopper goes from guest to
    /// authenticated; signing out re-arms it.
    pub async fn on_auth_transition(
        &self,
        previous: &AuthStatus,
        current: &AuthStatus,
    ) -> SyncReport {
        match (previous, current) {
            (_, AuthStatus::Guest) => {
                self.fired.store(false, Ordering::SeqCst);

                SyncReport::Skipped
            }
            (AuthStatus::Guest, AuthStatus::Authenticated { customer }) => {
                if self.fired.swap(true, Ordering::SeqCst) {
                    debug!("guest cart already synced for this sign-in");

                    return SyncReport::Skipped;
                }

                self.run(customer).await
            }
            (AuthStatus::Authenticated { .. }, AuthStatus::Authenticated { .. }) => {
                SyncReport::Skipped
            }
        }
    }

    /// Send every guest entry to the server in one batch.
    ///
    /// The guest cart is cleared only once the server has answered for each
    /// entry; a failed call leaves it untouched.
    #[instrument(skip(self))]
    pub async fn run(&self, customer: &CustomerId) -> SyncReport {
        let entries = self.local.entries();

        if entries.is_empty() {
            debug!("no guest entries to sync");

            return SyncReport::Skipped;
        }

        let sent = entries.len();

        let outcome = match self.gateway.sync_cart(entries.into_vec()).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%error, sent, "guest cart sync failed, keeping local entries");

                self.notifier.notify(Notification {
                    level: Level::Error,
                    message: match error.kind() {
                        ErrorKind::Auth => messages::SESSION_EXPIRED,
                        _ => messages::SYNC_NETWORK,
                    }
                    .to_string(),
                    retryable: error.is_retryable(),
                });

                return SyncReport::Failed(error);
            }
        };

        if let Err(error) = self.local.clear() {
            warn!(%error, "failed to clear guest cart after sync");
        }

        let summary = outcome.summary();

        self.cache
            .replace(&CartKey::Customer(customer.clone()), outcome.cart);
        self.cache.evict(&CartKey::Guest);

        info!(sent, ?summary, "guest cart synced");

        self.announce(summary).await;

        SyncReport::Completed(summary)
    }

    async fn announce(&self, summary: SyncSummary) {
        match summary {
            SyncSummary::Empty => {}
            SyncSummary::AllSynced { synced } => {
                self.notifier
                    .notify(Notification::success(messages::synced(synced)));
            }
            SyncSummary::AllFailed { cause, .. } => {
                self.notifier.notify(Notification::warning(match cause {
                    FailureCause::ProductsGone => messages::SYNC_ALL_GONE,
                    FailureCause::SoldOut => messages::SYNC_ALL_SOLD_OUT,
                    FailureCause::Mixed => messages::SYNC_ALL_FAILED,
                }));
            }
            SyncSummary::Partial {
                synced,
                failed,
                deleted,
                out_of_stock,
            } => {
                self.notifier.notify(Notification::warning(
                    messages::partially_synced(synced, failed),
                ));

                if let Some(breakdown) = messages::sync_breakdown(deleted, out_of_stock) {
                    tokio::time::sleep(self.breakdown_delay).await;

                    self.notifier.notify(Notification::info(breakdown));
                }
            }
        }
    }
}
