//! Authentication status as seen by the cart engine.

use pawcart::ids::CustomerId;

use crate::cache::CartKey;

/// Whether the shopper is signed in, passed explicitly to every cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Guest,

    Authenticated {
        customer: CustomerId,
    },
}

impl AuthStatus {
    pub fn authenticated(customer: impl Into<CustomerId>) -> Self {
        Self::Authenticated {
            customer: customer.into(),
        }
    }

    pub fn customer(&self) -> Option<&CustomerId> {
        match self {
            Self::Guest => None,
            Self::Authenticated { customer } => Some(customer),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.customer().is_some()
    }

    /// Cache slot holding this shopper's cart.
    pub fn cart_key(&self) -> CartKey {
        match self {
            Self::Guest => CartKey::Guest,
            Self::Authenticated { customer } => CartKey::Customer(customer.clone()),
        }
    }
}
