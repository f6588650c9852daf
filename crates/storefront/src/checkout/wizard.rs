//! Checkout wizard state machine.
//!
//! Three steps, strictly linear: delivery -> payment -> review. `next` is
//! gated by validation of the current step only; `prev` is always allowed
//! and loses no data. The whole wizard round-trips through the session.

use serde::{Deserialize, Serialize};
use spindle_core::Email;

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Delivery,
    Payment,
    Review,
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Pay the courier on delivery; the order completes synchronously.
    CashOnDelivery,
    /// Hosted gateway redirect; the order completes on the return callback.
    Gateway,
}

/// Contact and address fields gathered on the delivery step.
///
/// The address is hierarchical: province -> district -> ward. Resetting a
/// higher level clears everything below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySelection {
    pub recipient_name: String,
    pub email: String,
    pub phone: String,
    pub province: String,
    pub district: String,
    pub ward: String,
    pub address: String,
    pub delivery_message: Option<String>,
    pub rush_requested: bool,
}

/// A validation failure on one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn required(field: &'static str) -> Self {
        Self {
            field,
            message: "This field is required".to_string(),
        }
    }
}

/// The in-progress checkout, persisted in the session between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wizard {
    pub step: Step,
    pub delivery: DeliverySelection,
    pub payment_method: Option<PaymentMethod>,
}

impl Wizard {
    /// Start a fresh checkout on the delivery step.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the province, cascading a reset of district and ward.
    ///
    /// Leaving the rush-service region also forces `rush_requested` off, so
    /// a stale rush flag can never survive a province change.
    pub fn set_province(&mut self, province: String, rush_region: &str) {
        if self.delivery.province != province {
            self.delivery.district.clear();
            self.delivery.ward.clear();
        }
        if province != rush_region {
            self.delivery.rush_requested = false;
        }
        self.delivery.province = province;
    }

    /// Set the district, cascading a reset of the ward.
    pub fn set_district(&mut self, district: String) {
        if self.delivery.district != district {
            self.delivery.ward.clear();
        }
        self.delivery.district = district;
    }

    /// Request or drop rush delivery. The request only sticks when the
    /// selected province is the rush-service region.
    pub fn request_rush(&mut self, requested: bool, rush_region: &str) {
        self.delivery.rush_requested = requested && self.delivery.province == rush_region;
    }

    /// Advance one step, validating the current step's fields first.
    ///
    /// # Errors
    ///
    /// Returns the per-field errors that block the advance; the step does
    /// not change.
    pub fn next(&mut self) -> Result<Step, Vec<FieldError>> {
        match self.step {
            Step::Delivery => {
                let errors = validate_delivery(&self.delivery);
                if !errors.is_empty() {
                    return Err(errors);
                }
                self.step = Step::Payment;
            }
            Step::Payment => {
                if self.payment_method.is_none() {
                    return Err(vec![FieldError {
                        field: "payment_method",
                        message: "Select a payment method".to_string(),
                    }]);
                }
                self.step = Step::Review;
            }
            Step::Review => {}
        }
        Ok(self.step)
    }

    /// Go back one step. Always allowed; nothing is cleared.
    pub fn prev(&mut self) -> Step {
        self.step = match self.step {
            Step::Delivery | Step::Payment => Step::Delivery,
            Step::Review => Step::Payment,
        };
        self.step
    }
}

/// Validate the delivery step's required fields.
#[must_use]
pub fn validate_delivery(delivery: &DeliverySelection) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if delivery.recipient_name.trim().is_empty() {
        errors.push(FieldError::required("recipient_name"));
    }

    if delivery.email.trim().is_empty() {
        errors.push(FieldError::required("email"));
    } else if Email::parse(&delivery.email).is_err() {
        errors.push(FieldError {
            field: "email",
            message: "Invalid email address".to_string(),
        });
    }

    if delivery.phone.trim().is_empty() {
        errors.push(FieldError::required("phone"));
    } else if normalize_phone(&delivery.phone).is_none() {
        errors.push(FieldError {
            field: "phone",
            message: "Phone number must be 10-11 digits".to_string(),
        });
    }

    for (field, value) in [
        ("province", &delivery.province),
        ("district", &delivery.district),
        ("ward", &delivery.ward),
        ("address", &delivery.address),
    ] {
        if value.trim().is_empty() {
            errors.push(FieldError::required(field));
        }
    }

    errors
}

/// Strip common separators from a phone number and check it is 10-11
/// digits. Returns the digits-only form.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();
    if cleaned.len() >= 10
        && cleaned.len() <= 11
        && cleaned.chars().all(|c| c.is_ascii_digit())
    {
        Some(cleaned)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RUSH_REGION: &str = "Hanoi";

    fn filled_delivery() -> DeliverySelection {
        DeliverySelection {
            recipient_name: "Nguyen Van A".to_string(),
            email: "a@example.com".to_string(),
            phone: "0912 345 678".to_string(),
            province: "Hanoi".to_string(),
            district: "Ba Dinh".to_string(),
            ward: "Truc Bach".to_string(),
            address: "12 Pho Hang Ma".to_string(),
            delivery_message: None,
            rush_requested: false,
        }
    }

    #[test]
    fn test_next_blocked_by_missing_field_then_advances() {
        let mut wizard = Wizard::new();
        wizard.delivery = filled_delivery();
        wizard.delivery.ward.clear();

        let errors = wizard.next().unwrap_err();
        assert_eq!(wizard.step, Step::Delivery);
        assert!(errors.iter().any(|e| e.field == "ward"));

        wizard.delivery.ward = "Truc Bach".to_string();
        assert_eq!(wizard.next().unwrap(), Step::Payment);
    }

    #[test]
    fn test_payment_step_requires_method() {
        let mut wizard = Wizard::new();
        wizard.delivery = filled_delivery();
        wizard.next().unwrap();

        let errors = wizard.next().unwrap_err();
        assert_eq!(errors[0].field, "payment_method");
        assert_eq!(wizard.step, Step::Payment);

        wizard.payment_method = Some(PaymentMethod::CashOnDelivery);
        assert_eq!(wizard.next().unwrap(), Step::Review);
    }

    #[test]
    fn test_next_on_review_stays_put() {
        let mut wizard = Wizard::new();
        wizard.delivery = filled_delivery();
        wizard.payment_method = Some(PaymentMethod::Gateway);
        wizard.next().unwrap();
        wizard.next().unwrap();
        assert_eq!(wizard.next().unwrap(), Step::Review);
    }

    #[test]
    fn test_prev_preserves_data() {
        let mut wizard = Wizard::new();
        wizard.delivery = filled_delivery();
        wizard.next().unwrap();
        assert_eq!(wizard.prev(), Step::Delivery);
        assert_eq!(wizard.delivery, filled_delivery());
        // prev from the first step is a no-op
        assert_eq!(wizard.prev(), Step::Delivery);
    }

    #[test]
    fn test_province_change_cascades_reset() {
        let mut wizard = Wizard::new();
        wizard.delivery = filled_delivery();
        wizard.set_province("Da Nang".to_string(), RUSH_REGION);
        assert!(wizard.delivery.district.is_empty());
        assert!(wizard.delivery.ward.is_empty());
    }

    #[test]
    fn test_leaving_rush_region_forces_rush_off() {
        let mut wizard = Wizard::new();
        wizard.delivery = filled_delivery();
        wizard.request_rush(true, RUSH_REGION);
        assert!(wizard.delivery.rush_requested);

        wizard.set_province("Hue".to_string(), RUSH_REGION);
        assert!(!wizard.delivery.rush_requested);
    }

    #[test]
    fn test_rush_request_outside_region_does_not_stick() {
        let mut wizard = Wizard::new();
        wizard.delivery = filled_delivery();
        wizard.delivery.province = "Hue".to_string();
        wizard.request_rush(true, RUSH_REGION);
        assert!(!wizard.delivery.rush_requested);
    }

    #[test]
    fn test_district_change_resets_ward_only() {
        let mut wizard = Wizard::new();
        wizard.delivery = filled_delivery();
        wizard.set_district("Hoan Kiem".to_string());
        assert!(wizard.delivery.ward.is_empty());
        assert_eq!(wizard.delivery.province, "Hanoi");
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(
            normalize_phone("0912 345 678").as_deref(),
            Some("0912345678")
        );
        assert_eq!(
            normalize_phone("(091) 234-56-789").as_deref(),
            Some("09123456789")
        );
        assert!(normalize_phone("091234567").is_none()); // 9 digits
        assert!(normalize_phone("091234567890").is_none()); // 12 digits
        assert!(normalize_phone("09x2345678").is_none());
        assert!(normalize_phone("+840912345678").is_none());
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let errors = validate_delivery(&DeliverySelection::default());
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        for expected in [
            "recipient_name",
            "email",
            "phone",
            "province",
            "district",
            "ward",
            "address",
        ] {
            assert!(fields.contains(&expected), "missing error for {expected}");
        }
    }

    #[test]
    fn test_bad_email_is_field_error() {
        let mut delivery = filled_delivery();
        delivery.email = "not-an-email".to_string();
        let errors = validate_delivery(&delivery);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
    }
}
