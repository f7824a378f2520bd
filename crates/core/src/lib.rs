//! Pawcart
//!
//! Cart domain for the pawcart storefront: products, line items, guest cart
//! entries, quantity rules, sync outcomes and the pricing calculator. This
//! crate performs no I/O.

pub mod carts;
pub mod entries;
pub mod ids;
pub mod items;
pub mod pricing;
pub mod products;
pub mod quantity;
pub mod sync;

pub mod prelude;
