//! Cart consistency and synchronization engine for the pawcart storefront.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod errors;
pub mod gateway;
pub mod hydrator;
pub mod local;
pub mod notifications;
pub mod observability;
pub mod retry;
pub mod session;
pub mod source;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod test;
