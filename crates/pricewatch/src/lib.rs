// Copyright 2026 Pricewatch Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pricewatch library: track product prices on e-commerce pages.
//!
//! A check cycle resolves a site strategy for each registered product,
//! extracts its price (static fetch first, rendered page second), records the
//! observation and alerts when the price sits at or below the product's
//! threshold. The binary wraps this in a small CLI and scheduler.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod extraction;
pub mod monitor;
pub mod notify;
pub mod renderer;
pub mod report;
pub mod temporal;
pub mod types;
