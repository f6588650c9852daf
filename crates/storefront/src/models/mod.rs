//! Domain models held by the storefront: products and the session cart.

pub mod cart;
pub mod product;
pub mod session;

pub use cart::{Cart, CartLine};
pub use product::Product;
