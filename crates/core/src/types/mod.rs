//! Core domain types.

pub mod email;
pub mod id;
pub mod kind;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{InvoiceId, OrderId, ProductId, UserId};
pub use kind::ProductKind;
pub use price::Price;
pub use status::{OrderStatus, PaymentStatus, TransitionError};
