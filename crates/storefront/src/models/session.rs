//! Session persistence for the cart and checkout wizard.
//!
//! Each value lives under a single named key and is rewritten whole after
//! every mutation. Loading an absent key yields the default, so a fresh
//! session always starts with an empty cart.

use tower_sessions::Session;

use crate::checkout::Wizard;
use crate::error::AppError;
use crate::models::Cart;

/// Session keys for storefront data.
pub mod keys {
    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for the in-progress checkout wizard.
    pub const CHECKOUT: &str = "checkout";

    /// Key holding the start timestamp of an in-flight order submission,
    /// to reject double-submits from the same session.
    pub const CHECKOUT_IN_FLIGHT: &str = "checkout_in_flight";
}

/// How long an in-flight marker is honored. A submission that crashed
/// without clearing its marker must not lock the session out of checkout
/// for the cookie's whole lifetime.
const SUBMISSION_LATCH_TTL_SECS: i64 = 300;

/// Load the cart, defaulting to empty.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn load_cart(session: &Session) -> Result<Cart, AppError> {
    Ok(session.get(keys::CART).await?.unwrap_or_default())
}

/// Persist the cart.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), AppError> {
    session.insert(keys::CART, cart).await?;
    Ok(())
}

/// Load the checkout wizard, if one has been started.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn load_wizard(session: &Session) -> Result<Option<Wizard>, AppError> {
    Ok(session.get(keys::CHECKOUT).await?)
}

/// Persist the checkout wizard.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn save_wizard(session: &Session, wizard: &Wizard) -> Result<(), AppError> {
    session.insert(keys::CHECKOUT, wizard).await?;
    Ok(())
}

/// Drop the wizard, e.g. after a completed or abandoned checkout.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn clear_wizard(session: &Session) -> Result<(), AppError> {
    session.remove::<Wizard>(keys::CHECKOUT).await?;
    Ok(())
}

/// Try to mark a submission as in flight. Returns `false` if a live one
/// already is; a marker older than the latch TTL is treated as the debris
/// of a crashed submission and reclaimed.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn begin_submission(session: &Session) -> Result<bool, AppError> {
    let now = chrono::Utc::now().timestamp();
    if let Some(started_at) = session.get::<i64>(keys::CHECKOUT_IN_FLIGHT).await? {
        if now - started_at < SUBMISSION_LATCH_TTL_SECS {
            return Ok(false);
        }
    }
    session.insert(keys::CHECKOUT_IN_FLIGHT, now).await?;
    Ok(true)
}

/// Clear the in-flight marker once the submission settles either way.
///
/// # Errors
///
/// Returns [`AppError::Session`] if the session store fails.
pub async fn end_submission(session: &Session) -> Result<(), AppError> {
    session.remove::<i64>(keys::CHECKOUT_IN_FLIGHT).await?;
    Ok(())
}
