//! Tower middleware layers for the storefront.

pub mod session;
