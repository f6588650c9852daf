//! Checkout: the three-step wizard and the order submission pipeline.

pub mod submit;
pub mod wizard;

pub use submit::{CheckoutError, SubmissionOutcome};
pub use wizard::{DeliverySelection, FieldError, PaymentMethod, Step, Wizard};
