//! Checkout: the step accordion, billing validation and order placement.
//!
//! [`CheckoutStepState`] belongs to a single checkout view and is discarded
//! with it. [`OrderOrchestrator`] is process-wide and owns the one in-flight
//! order.

mod orchestrator;
mod steps;

pub use orchestrator::{
    CheckoutApi, CheckoutError, CheckoutOutcome, OrderOrchestrator, OrderResult, OrderState,
    TerminalAction,
};
pub use steps::{BillingDetails, CheckoutStep, CheckoutStepState, ValidationError};
