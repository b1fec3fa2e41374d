//! Checkout step accordion and billing validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use verdant_core::CustomerType;

/// Local precondition failures for placing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please fill required billing fields (name, address)")]
    MissingName,

    #[error("Please fill required billing fields (name, address)")]
    MissingAddress,
}

// =============================================================================
// Steps
// =============================================================================

/// The six checkout steps, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    CheckoutMethod,
    BillingInformation,
    ShippingInformation,
    ShippingMethod,
    PaymentInformation,
    OrderReview,
}

impl CheckoutStep {
    /// All steps in order.
    pub const ALL: [Self; 6] = [
        Self::CheckoutMethod,
        Self::BillingInformation,
        Self::ShippingInformation,
        Self::ShippingMethod,
        Self::PaymentInformation,
        Self::OrderReview,
    ];

    /// Zero-based position of the step.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The step after this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Heading shown for the step.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::CheckoutMethod => "Checkout Method",
            Self::BillingInformation => "Billing Information",
            Self::ShippingInformation => "Shipping Information",
            Self::ShippingMethod => "Shipping Method",
            Self::PaymentInformation => "Payment Information",
            Self::OrderReview => "Order Review",
        }
    }
}

/// Expanded/collapsed state of the checkout accordion.
///
/// Steps toggle independently; several may be open at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutStepState {
    expanded: [bool; CheckoutStep::ALL.len()],
    customer_type: CustomerType,
}

impl Default for CheckoutStepState {
    fn default() -> Self {
        Self {
            expanded: [true, false, false, false, false, false],
            customer_type: CustomerType::Guest,
        }
    }
}

impl CheckoutStepState {
    /// Only the first step open, guest checkout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one step's expanded flag, leaving the others untouched.
    pub fn toggle(&mut self, step: CheckoutStep) {
        if let Some(flag) = self.expanded.get_mut(step.index()) {
            *flag = !*flag;
        }
    }

    /// Whether `step` is expanded.
    #[must_use]
    pub fn is_expanded(&self, step: CheckoutStep) -> bool {
        self.expanded.get(step.index()).copied().unwrap_or(false)
    }

    /// Steps currently expanded, in order.
    #[must_use]
    pub fn expanded_steps(&self) -> Vec<CheckoutStep> {
        CheckoutStep::ALL
            .into_iter()
            .filter(|step| self.is_expanded(*step))
            .collect()
    }

    /// "Continue" from `step`: toggles the following step.
    ///
    /// Returns the step that was toggled, or `None` from the last step.
    pub fn advance_from(&mut self, step: CheckoutStep) -> Option<CheckoutStep> {
        let next = step.next()?;
        self.toggle(next);
        Some(next)
    }

    #[must_use]
    pub const fn customer_type(&self) -> CustomerType {
        self.customer_type
    }

    pub const fn set_customer_type(&mut self, customer_type: CustomerType) {
        self.customer_type = customer_type;
    }

    /// Whether the order may be submitted with `billing`.
    #[must_use]
    pub fn can_submit(&self, billing: &BillingDetails) -> bool {
        billing.validate().is_ok()
    }
}

// =============================================================================
// Billing
// =============================================================================

/// Billing form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl BillingDetails {
    /// Required-field check shared by the step flow and the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns `MissingName` or `MissingAddress` when either is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.address.trim().is_empty() {
            return Err(ValidationError::MissingAddress);
        }
        Ok(())
    }

    /// Single-line shipping address: `address, city state zip, country`.
    ///
    /// Parts are trimmed; empty parts and empty groups are dropped.
    #[must_use]
    pub fn shipping_address(&self) -> String {
        let locality = [&self.city, &self.state, &self.zip]
            .iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        [self.address.trim(), locality.as_str(), self.country.trim()]
            .into_iter()
            .filter(|group| !group.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
