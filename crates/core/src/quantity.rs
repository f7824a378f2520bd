//! Quantity Bounds

/// Smallest quantity a line item can hold.
pub const MIN_QTY: u32 = 1;

/// Largest quantity a line item can hold.
pub const MAX_QTY: u32 = 99;

/// Inclusive bounds for a line item quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityBounds {
    min: u32,
    max: u32,
}

impl QuantityBounds {
    /// Create bounds; `min` is raised to [`MIN_QTY`] and `max` to at least `min`.
    pub fn new(min: u32, max: u32) -> Self {
        let min = min.max(MIN_QTY);

        Self {
            min,
            max: max.max(min),
        }
    }

    /// Lower bound
    pub fn min(self) -> u32 {
        self.min
    }

    /// Upper bound
    pub fn max(self) -> u32 {
        self.max
    }

    /// Whether `quantity` is within bounds and, when stock is known, does not exceed it.
    pub fn permits(self, quantity: u32, stock: Option<u32>) -> bool {
        (self.min..=self.max).contains(&quantity) && stock.is_none_or(|stock| quantity <= stock)
    }
}

impl Default for QuantityBounds {
    fn default() -> Self {
        Self::new(MIN_QTY, MAX_QTY)
    }
}
