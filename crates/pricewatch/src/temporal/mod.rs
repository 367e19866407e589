//! Price history and the decisions made against it.
//!
//! `store` persists products and observations; `watch` turns the newest pair
//! of observations into drop/alert decisions.

pub mod store;
pub mod watch;
