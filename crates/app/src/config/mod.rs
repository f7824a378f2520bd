//! Engine configuration module

use std::{path::PathBuf, time::Duration};

use clap::Args;
use pawcart::{
    ids::CustomerId,
    pricing::{DEFAULT_TAX_RATE, TaxRate},
    quantity::{MAX_QTY, MIN_QTY, QuantityBounds},
};

use crate::{retry::RetryPolicy, session::AuthStatus};

pub mod logging;

/// Cart engine settings.
#[derive(Debug, Clone, Args)]
pub struct EngineConfig {
    /// Storefront API base URL
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:3000/api")]
    pub api_base_url: String,

    /// Base URL for relative product image paths; defaults to the API base
    #[arg(long, env = "ASSET_BASE_URL")]
    pub asset_base_url: Option<String>,

    /// Bearer token of a signed-in customer
    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Customer the bearer token belongs to
    #[arg(long, env = "CUSTOMER_ID")]
    pub customer_id: Option<String>,

    /// Sales tax rate as a fraction
    #[arg(long, env = "TAX_RATE", default_value_t = DEFAULT_TAX_RATE)]
    pub tax_rate: f64,

    /// Directory holding the guest cart
    #[arg(long, env = "GUEST_CART_DIR", default_value = ".pawcart")]
    pub guest_cart_dir: PathBuf,

    /// Attempts made to refetch a cart after a change
    #[arg(long, env = "REFRESH_ATTEMPTS", default_value_t = 3)]
    pub refresh_attempts: u32,

    /// Base backoff between refetch attempts, in milliseconds
    #[arg(long, env = "REFRESH_BACKOFF_MS", default_value_t = 200)]
    pub refresh_backoff_ms: u64,

    /// Seconds before a cached cart is considered stale
    #[arg(long, env = "HYDRATION_STALE_SECS", default_value_t = 30)]
    pub hydration_stale_secs: u64,

    /// Pause before the breakdown of a partial sync, in milliseconds
    #[arg(long, env = "SYNC_BREAKDOWN_DELAY_MS", default_value_t = 1_500)]
    pub sync_breakdown_delay_ms: u64,

    /// Largest quantity a guest line may hold
    #[arg(long, env = "MAX_QTY", default_value_t = MAX_QTY)]
    pub max_qty: u32,
}

impl EngineConfig {
    /// Signed in only when both a token and the customer it belongs to are set.
    pub fn auth_status(&self) -> AuthStatus {
        match (&self.api_token, &self.customer_id) {
            (Some(_), Some(customer)) => AuthStatus::authenticated(CustomerId::new(customer)),
            _ => AuthStatus::Guest,
        }
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_fraction(self.tax_rate)
    }

    pub fn quantity_bounds(&self) -> QuantityBounds {
        QuantityBounds::new(MIN_QTY, self.max_qty)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.refresh_attempts,
            Duration::from_millis(self.refresh_backoff_ms),
        )
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.hydration_stale_secs)
    }

    pub fn breakdown_delay(&self) -> Duration {
        Duration::from_millis(self.sync_breakdown_delay_ms)
    }
}
