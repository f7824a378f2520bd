//! Remote Cart Gateway

pub mod models;
pub mod service;

pub use models::{LineItemUpdate, NewLineItem};
pub use service::*;
