//! Order submission pipeline.
//!
//! Runs only from the review step. The catalog is re-fetched (cache
//! bypassed) and the cart is validated against live stock before any order
//! is created; rush eligibility is trusted from the catalog, never from the
//! cart snapshot. Two completion paths:
//!
//! - cash on delivery: the order completes synchronously and the cart is
//!   cleared immediately;
//! - gateway: the customer is redirected to the hosted payment page, and
//!   the cart is cleared only on a confirmed success return, so a failed
//!   payment loses nothing.
//!
//! Any failure leaves the cart and wizard untouched for a retry.

use serde::Serialize;
use spindle_core::{Email, OrderId, Price, ProductId};
use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::api::orders::{
    DeliveryInfo, OrderCreated, OrderCreationRequest, OrderLineRequest,
};
use crate::api::payments::PaymentReturn;
use crate::error::AppError;
use crate::models::{Cart, CartLine, Product, session};
use crate::pricing::{Quote, quote};
use crate::state::AppState;

use super::wizard::{
    DeliverySelection, FieldError, PaymentMethod, Step, Wizard, normalize_phone, validate_delivery,
};

/// Why a submission was rejected before reaching the commerce API.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// No checkout has been started in this session.
    #[error("No checkout in progress")]
    NotStarted,

    /// Submission is only valid from the review step.
    #[error("Checkout is not on the review step")]
    NotOnReview,

    /// Delivery or payment fields failed validation.
    #[error("Checkout fields are invalid")]
    InvalidFields(Vec<FieldError>),

    /// The live catalog no longer supports this cart.
    #[error("Stock changed since the cart was assembled")]
    StockChanged { issues: Vec<StockIssue> },

    /// A submission from this session is already in flight.
    #[error("An order submission is already in progress")]
    AlreadyInFlight,
}

/// One line-level finding from the pre-submission stock check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum StockIssue {
    /// The product has disappeared from the catalog.
    Missing { product_id: ProductId },

    /// Requested quantity exceeds live stock. A warning only; the server
    /// makes the final call at order creation.
    Insufficient {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The cart snapshot said rush-eligible but the live catalog disagrees,
    /// and the customer requested rush.
    RushIneligible { product_id: ProductId },

    /// Re-pricing from the live catalog moved the total away from what the
    /// customer reviewed. The order is placed at the current total.
    TotalChanged { was: Price, now: Price },
}

impl StockIssue {
    /// Whether this finding blocks submission outright.
    #[must_use]
    pub const fn blocking(&self) -> bool {
        matches!(self, Self::Missing { .. } | Self::RushIneligible { .. })
    }
}

/// What the customer should do after a successful submission.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// Order placed and complete; the cart has been cleared.
    Completed {
        order_id: OrderId,
        total: Price,
        warnings: Vec<StockIssue>,
    },
    /// Order placed; finish payment at the gateway. Cart still intact.
    GatewayRedirect {
        order_id: OrderId,
        payment_url: String,
        warnings: Vec<StockIssue>,
    },
}

/// Check the cart against the live catalog.
///
/// Pure; the caller fetches `fresh` with the cache bypassed. Findings that
/// return `blocking() == true` must stop the submission.
#[must_use]
pub fn validate_against_stock(
    lines: &[CartLine],
    fresh: &[Product],
    rush_requested: bool,
) -> Vec<StockIssue> {
    let mut issues = Vec::new();
    for line in lines {
        let Some(current) = fresh.iter().find(|p| p.id == line.product.id) else {
            issues.push(StockIssue::Missing {
                product_id: line.product.id,
            });
            continue;
        };
        if !current.has_stock(line.quantity) {
            issues.push(StockIssue::Insufficient {
                product_id: current.id,
                requested: line.quantity,
                available: current.available,
            });
        }
        if rush_requested && line.product.rush_eligible && !current.rush_eligible {
            issues.push(StockIssue::RushIneligible {
                product_id: current.id,
            });
        }
    }
    issues
}

/// Compare the quote the customer reviewed with the one re-priced from the
/// live catalog. A changed total is surfaced as a non-blocking warning.
#[must_use]
pub fn quote_drift(reviewed: &Quote, current: &Quote) -> Option<StockIssue> {
    (reviewed.total != current.total).then_some(StockIssue::TotalChanged {
        was: reviewed.total,
        now: current.total,
    })
}

/// Assemble the order creation request from priced lines and the wizard.
///
/// A line ships rush when the customer requested rush and the product is
/// rush-eligible; mixed carts split into two parcels.
///
/// # Errors
///
/// Returns [`CheckoutError::InvalidFields`] if the delivery fields do not
/// validate (they are re-checked here rather than trusted from the wizard).
pub fn build_order_request(
    lines: &[CartLine],
    delivery: &DeliverySelection,
    method: PaymentMethod,
    quote: &Quote,
) -> Result<OrderCreationRequest, CheckoutError> {
    let field_errors = validate_delivery(delivery);
    if !field_errors.is_empty() {
        return Err(CheckoutError::InvalidFields(field_errors));
    }
    // validate_delivery guarantees both of these parse
    let email = Email::parse(&delivery.email).map_err(|_| {
        CheckoutError::InvalidFields(vec![FieldError {
            field: "email",
            message: "Invalid email address".to_string(),
        }])
    })?;
    let phone = normalize_phone(&delivery.phone).ok_or_else(|| {
        CheckoutError::InvalidFields(vec![FieldError {
            field: "phone",
            message: "Phone number must be 10-11 digits".to_string(),
        }])
    })?;

    let order_lines = lines
        .iter()
        .map(|line| OrderLineRequest {
            product_id: line.product.id,
            quantity: line.quantity,
            unit_price: line.product.price,
            rush: delivery.rush_requested && line.product.rush_eligible,
        })
        .collect();

    Ok(OrderCreationRequest {
        lines: order_lines,
        delivery: DeliveryInfo {
            recipient_name: delivery.recipient_name.trim().to_string(),
            email,
            phone,
            province: delivery.province.clone(),
            district: delivery.district.clone(),
            ward: delivery.ward.clone(),
            address: delivery.address.trim().to_string(),
            delivery_message: delivery.delivery_message.clone(),
        },
        payment_method: match method {
            PaymentMethod::CashOnDelivery => "cash_on_delivery".to_string(),
            PaymentMethod::Gateway => "gateway".to_string(),
        },
        subtotal: quote.subtotal,
        vat: quote.vat,
        delivery_fee: quote.delivery_fee,
        total: quote.total,
    })
}

/// Run the submission pipeline for the current session.
///
/// # Errors
///
/// Returns [`CheckoutError`] variants for precondition failures, or the
/// underlying API/session error. On any error the cart and wizard are left
/// as they were.
#[instrument(skip_all)]
pub async fn submit(state: &AppState, session: &Session) -> Result<SubmissionOutcome, AppError> {
    let wizard = session::load_wizard(session)
        .await?
        .ok_or(CheckoutError::NotStarted)?;
    if wizard.step != Step::Review {
        return Err(CheckoutError::NotOnReview.into());
    }
    let method = wizard
        .payment_method
        .ok_or_else(|| CheckoutError::InvalidFields(vec![FieldError {
            field: "payment_method",
            message: "Select a payment method".to_string(),
        }]))?;

    let cart = session::load_cart(session).await?;
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    // One submission per session at a time
    if !session::begin_submission(session).await? {
        return Err(CheckoutError::AlreadyInFlight.into());
    }
    let result = run_submission(state, session, &wizard, &cart, method).await;
    session::end_submission(session).await?;
    result
}

async fn run_submission(
    state: &AppState,
    session: &Session,
    wizard: &Wizard,
    cart: &Cart,
    method: PaymentMethod,
) -> Result<SubmissionOutcome, AppError> {
    let ids: Vec<ProductId> = cart.lines().iter().map(|l| l.product.id).collect();
    let fresh = state.catalog().get_products_fresh(ids).await?;

    let issues = validate_against_stock(cart.lines(), &fresh, wizard.delivery.rush_requested);
    if issues.iter().any(StockIssue::blocking) {
        warn!(issues = issues.len(), "Submission blocked by stock check");
        return Err(CheckoutError::StockChanged { issues }.into());
    }
    let mut warnings = issues;

    // Re-price from the live catalog so the order carries current prices
    let priced_lines: Vec<CartLine> = cart
        .lines()
        .iter()
        .filter_map(|line| {
            fresh
                .iter()
                .find(|p| p.id == line.product.id)
                .map(|product| CartLine {
                    product: product.clone(),
                    quantity: line.quantity,
                })
        })
        .collect();
    let reviewed_quote = quote(cart.lines(), &wizard.delivery, &state.config().pricing);
    let current_quote = quote(&priced_lines, &wizard.delivery, &state.config().pricing);
    if let Some(drift) = quote_drift(&reviewed_quote, &current_quote) {
        warn!(was = %reviewed_quote.total, now = %current_quote.total, "Total moved since review");
        warnings.push(drift);
    }

    let request = build_order_request(&priced_lines, &wizard.delivery, method, &current_quote)?;
    let created: OrderCreated = state.orders().create_order(&request).await?;
    info!(order_id = %created.order_id, "Order created");

    match method {
        PaymentMethod::CashOnDelivery => {
            clear_checkout(session).await?;
            Ok(SubmissionOutcome::Completed {
                order_id: created.order_id,
                total: created.total,
                warnings,
            })
        }
        PaymentMethod::Gateway => {
            let redirect = state
                .payments()
                .create_redirect(created.order_id, created.total)
                .await?;
            Ok(SubmissionOutcome::GatewayRedirect {
                order_id: created.order_id,
                payment_url: redirect.payment_url,
                warnings,
            })
        }
    }
}

/// Settle a return callback from the payment gateway.
///
/// Clears the cart and wizard only on a confirmed success; a failed payment
/// leaves both intact so the customer can retry.
///
/// # Errors
///
/// Returns a session error.
#[instrument(skip(session), fields(order_id = %callback.order_id, status = %callback.status))]
pub async fn finish_gateway_return(
    session: &Session,
    callback: &PaymentReturn,
) -> Result<bool, AppError> {
    if !callback.is_success() {
        info!("Gateway reported failure, keeping cart");
        return Ok(false);
    }
    clear_checkout(session).await?;
    info!("Payment confirmed, cart cleared");
    Ok(true)
}

async fn clear_checkout(session: &Session) -> Result<(), AppError> {
    let mut cart = session::load_cart(session).await?;
    cart.clear();
    session::save_cart(session, &cart).await?;
    session::clear_wizard(session).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::PricingConfig;
    use crate::models::product::test_support::book;

    fn filled_delivery(rush: bool) -> DeliverySelection {
        DeliverySelection {
            recipient_name: "Nguyen Van A".to_string(),
            email: "a@example.com".to_string(),
            phone: "0912-345-678".to_string(),
            province: "Hanoi".to_string(),
            district: "Ba Dinh".to_string(),
            ward: "Truc Bach".to_string(),
            address: "12 Pho Hang Ma".to_string(),
            delivery_message: Some("leave at the door".to_string()),
            rush_requested: rush,
        }
    }

    fn line(product: Product, quantity: u32) -> CartLine {
        CartLine { product, quantity }
    }

    #[test]
    fn test_stock_check_passes_clean_cart() {
        let lines = vec![line(book(1, 100_000, 5, true), 2)];
        let fresh = vec![book(1, 100_000, 5, true)];
        assert!(validate_against_stock(&lines, &fresh, true).is_empty());
    }

    #[test]
    fn test_missing_product_blocks() {
        let lines = vec![line(book(1, 100_000, 5, false), 1)];
        let issues = validate_against_stock(&lines, &[], false);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].blocking());
        assert!(matches!(issues[0], StockIssue::Missing { .. }));
    }

    #[test]
    fn test_insufficient_stock_warns_without_blocking() {
        let lines = vec![line(book(1, 100_000, 5, false), 5)];
        let fresh = vec![book(1, 100_000, 2, false)];
        let issues = validate_against_stock(&lines, &fresh, false);
        assert_eq!(
            issues,
            vec![StockIssue::Insufficient {
                product_id: ProductId::new(1),
                requested: 5,
                available: 2,
            }]
        );
        assert!(!issues[0].blocking());
    }

    #[test]
    fn test_rush_revoked_blocks_when_rush_requested() {
        let lines = vec![line(book(1, 100_000, 5, true), 1)];
        let fresh = vec![book(1, 100_000, 5, false)];

        let issues = validate_against_stock(&lines, &fresh, true);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].blocking());

        // Without rush requested the mismatch is irrelevant
        assert!(validate_against_stock(&lines, &fresh, false).is_empty());
    }

    #[test]
    fn test_build_request_splits_rush_lines() {
        let config = PricingConfig {
            vat_percent: 10,
            regular_fee: Price::new(30_000),
            rush_fee: Price::new(50_000),
            rush_region: "Hanoi".to_string(),
        };
        let lines = vec![
            line(book(1, 100_000, 5, true), 1),
            line(book(2, 80_000, 5, false), 2),
        ];
        let delivery = filled_delivery(true);
        let q = quote(&lines, &delivery, &config);

        let request =
            build_order_request(&lines, &delivery, PaymentMethod::Gateway, &q).unwrap();
        assert!(request.lines[0].rush);
        assert!(!request.lines[1].rush);
        assert_eq!(request.payment_method, "gateway");
        assert_eq!(request.delivery.phone, "0912345678");
        assert_eq!(request.total, q.total);
        assert_eq!(
            request.delivery.delivery_message.as_deref(),
            Some("leave at the door")
        );
    }

    #[test]
    fn test_build_request_rejects_invalid_delivery() {
        let lines = vec![line(book(1, 100_000, 5, false), 1)];
        let mut delivery = filled_delivery(false);
        delivery.email = "nope".to_string();

        let err = build_order_request(&lines, &delivery, PaymentMethod::CashOnDelivery, &Quote::EMPTY)
            .unwrap_err();
        match err {
            CheckoutError::InvalidFields(fields) => {
                assert_eq!(fields[0].field, "email");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_total_drift_is_surfaced_without_blocking() {
        let config = PricingConfig::default();
        let delivery = filled_delivery(false);
        let reviewed = quote(&[line(book(1, 100_000, 5, false), 2)], &delivery, &config);
        let current = quote(&[line(book(1, 90_000, 5, false), 2)], &delivery, &config);

        let drift = quote_drift(&reviewed, &current).unwrap();
        assert!(!drift.blocking());
        assert_eq!(
            drift,
            StockIssue::TotalChanged {
                was: reviewed.total,
                now: current.total,
            }
        );
        assert!(quote_drift(&reviewed, &reviewed).is_none());
    }

    fn memory_session() -> Session {
        let store = std::sync::Arc::new(tower_sessions::MemoryStore::default());
        Session::new(None, store, None)
    }

    fn gateway_callback(status: &str) -> PaymentReturn {
        PaymentReturn {
            order_id: OrderId::new(7),
            amount: Price::new(270_000),
            status: status.to_string(),
            pay_date: None,
            transaction_ref: None,
        }
    }

    #[tokio::test]
    async fn test_gateway_failure_keeps_cart() {
        let session = memory_session();
        let mut cart = Cart::default();
        cart.add_item(book(1, 100_000, 5, false), 1);
        session::save_cart(&session, &cart).await.unwrap();

        let paid = finish_gateway_return(&session, &gateway_callback("24"))
            .await
            .unwrap();
        assert!(!paid);
        assert!(!session::load_cart(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_success_clears_cart_and_wizard() {
        let session = memory_session();
        let mut cart = Cart::default();
        cart.add_item(book(1, 100_000, 5, false), 1);
        session::save_cart(&session, &cart).await.unwrap();
        session::save_wizard(&session, &Wizard::new()).await.unwrap();

        let paid = finish_gateway_return(&session, &gateway_callback("00"))
            .await
            .unwrap();
        assert!(paid);
        assert!(session::load_cart(&session).await.unwrap().is_empty());
        assert!(session::load_wizard(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_submission_latch_is_exclusive() {
        let session = memory_session();
        assert!(session::begin_submission(&session).await.unwrap());
        assert!(!session::begin_submission(&session).await.unwrap());
        session::end_submission(&session).await.unwrap();
        assert!(session::begin_submission(&session).await.unwrap());
    }

    fn unreachable_state() -> crate::state::AppState {
        use secrecy::SecretString;

        use crate::config::{CommerceApiConfig, PaymentGatewayConfig, StorefrontConfig};

        // Port 1 is never listening, so every API call fails immediately.
        crate::state::AppState::new(StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("q".repeat(32)),
            commerce: CommerceApiConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                api_key: SecretString::from("k".repeat(32)),
            },
            payment: PaymentGatewayConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                return_url: "http://localhost:3000/checkout/return".to_string(),
                locale: "vn".to_string(),
            },
            pricing: PricingConfig::default(),
            sentry_dsn: None,
        })
    }

    #[tokio::test]
    async fn test_failed_submission_leaves_cart_and_wizard_intact() {
        let session = memory_session();
        let mut cart = Cart::default();
        cart.add_item(book(1, 100_000, 5, true), 2);
        session::save_cart(&session, &cart).await.unwrap();

        let mut wizard = Wizard::new();
        wizard.delivery = filled_delivery(true);
        wizard.payment_method = Some(PaymentMethod::Gateway);
        wizard.step = Step::Review;
        session::save_wizard(&session, &wizard).await.unwrap();

        let state = unreachable_state();
        assert!(submit(&state, &session).await.is_err());

        let cart_after = session::load_cart(&session).await.unwrap();
        assert_eq!(cart_after.item_quantity(ProductId::new(1)), 2);
        let wizard_after = session::load_wizard(&session).await.unwrap().unwrap();
        assert_eq!(wizard_after.step, Step::Review);
        // The in-flight marker was released, so a retry goes straight through
        assert!(session::begin_submission(&session).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_submission_marker_is_reclaimed() {
        let session = memory_session();
        let hour_ago = chrono::Utc::now().timestamp() - 3600;
        session
            .insert(session::keys::CHECKOUT_IN_FLIGHT, hour_ago)
            .await
            .unwrap();

        assert!(session::begin_submission(&session).await.unwrap());
    }

    #[test]
    fn test_no_rush_lines_without_rush_request() {
        let config = PricingConfig {
            vat_percent: 10,
            regular_fee: Price::new(30_000),
            rush_fee: Price::new(50_000),
            rush_region: "Hanoi".to_string(),
        };
        let lines = vec![line(book(1, 100_000, 5, true), 1)];
        let delivery = filled_delivery(false);
        let q = quote(&lines, &delivery, &config);
        let request =
            build_order_request(&lines, &delivery, PaymentMethod::CashOnDelivery, &q).unwrap();
        assert!(!request.lines[0].rush);
    }
}
