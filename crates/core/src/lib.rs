//! Spindle Core - Shared domain types.
//!
//! This crate provides common types used across the Spindle components:
//! - `storefront` - Customer-facing shop (cart, checkout, payment)
//! - `admin` - Back-office (order lifecycle, user administration)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Currency
//! amounts are integer Vietnamese dong; there are no fractional minor units
//! anywhere in the system.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and emails, plus
//!   product kinds and the order/payment status machines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
