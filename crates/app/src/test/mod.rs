//! Shared test support.

mod fixtures;

pub(crate) use context::{BREAKDOWN_DELAY, TestContext};
pub(crate) use fixtures::*;
