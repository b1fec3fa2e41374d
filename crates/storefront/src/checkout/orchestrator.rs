//! Order placement: create order, then payment session, then clear the cart.
//!
//! Exactly one order may be in flight. A call made while another is pending
//! is rejected before any request is issued. A failure after the order was
//! created leaves the order id in state so payment can be resumed with
//! [`OrderOrchestrator::resume_payment`]. Dropping an attempt's future
//! before it finishes moves the state to failed.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{info, instrument, warn};
use verdant_core::{OrderId, OrderStatus};

use super::steps::{BillingDetails, ValidationError};
use crate::collections::{CartStore, LineItem};
use crate::gateway::{CheckoutSession, CreatedOrder, GatewayError, OrderPayload};

/// Remote calls the orchestrator depends on.
pub trait CheckoutApi: Send + Sync + 'static {
    /// Create an order from `payload`.
    fn create_order(
        &self,
        payload: &OrderPayload,
    ) -> impl Future<Output = Result<CreatedOrder, GatewayError>> + Send;

    /// Create a payment session for an existing order.
    fn create_checkout_session(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<CheckoutSession, GatewayError>> + Send;
}

/// Errors from placing an order.
#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    ValidationFailed(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] GatewayError),

    #[error("order response did not include an order id")]
    OrderIdMissing,

    #[error("an order is already being placed")]
    AlreadyPending,

    #[error("no created order is awaiting payment")]
    NothingToResume,

    #[error("order attempt was interrupted")]
    Interrupted,
}

impl CheckoutError {
    /// Message suitable for showing to the shopper.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// What the caller should do once an order completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalAction {
    /// Send the shopper to the external payment page.
    Redirect(String),
    /// No payment page was returned; go back to the home page.
    NavigateHome,
}

/// Outcome of a completed order.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutOutcome {
    pub order_id: OrderId,
    pub session: CheckoutSession,
    pub action: TerminalAction,
}

/// The created order, kept while payment is outstanding.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderResult {
    pub order_id: Option<OrderId>,
    pub order: CreatedOrder,
}

/// Snapshot of the in-flight order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderState {
    pub status: OrderStatus,
    pub draft: Option<OrderPayload>,
    pub result: Option<OrderResult>,
    pub error: Option<String>,
    /// Id of the order created by the current attempt. Survives a failed
    /// payment step and is cleared when a new attempt begins.
    pub last_order_id: Option<OrderId>,
}

// =============================================================================
// OrderOrchestrator
// =============================================================================

/// Drives order creation and payment-session creation.
pub struct OrderOrchestrator<A> {
    inner: Arc<OrchestratorInner<A>>,
}

struct OrchestratorInner<A> {
    api: A,
    cart: CartStore,
    state: Mutex<OrderState>,
}

impl<A> Clone for OrderOrchestrator<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: CheckoutApi> OrderOrchestrator<A> {
    /// Create an orchestrator that clears `cart` on success.
    #[must_use]
    pub fn new(api: A, cart: CartStore) -> Self {
        Self {
            inner: Arc::new(OrchestratorInner {
                api,
                cart,
                state: Mutex::new(OrderState::default()),
            }),
        }
    }

    /// Place an order for `lines`, shipping to `billing`'s address.
    ///
    /// On success the cart is cleared and the order state is back to idle.
    ///
    /// # Errors
    ///
    /// - `AlreadyPending` if another order is in flight (nothing changes)
    /// - `ValidationFailed` for an empty cart or missing billing fields
    ///   (nothing changes, no request is made)
    /// - `Remote` or `OrderIdMissing` after the state moved to failed
    #[instrument(skip_all, fields(lines = lines.len()))]
    pub async fn place_order(
        &self,
        lines: &[LineItem],
        billing: &BillingDetails,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let (payload, guard) = self.begin_order(lines, billing)?;

        let order = match self.inner.api.create_order(&payload).await {
            Ok(order) => order,
            Err(e) => return Err(self.fail(guard, e.into())),
        };

        let order_id = order.order_id();
        {
            let mut state = self.lock();
            state.result = Some(OrderResult {
                order_id: order_id.clone(),
                order,
            });
            if order_id.is_some() {
                state.last_order_id.clone_from(&order_id);
            }
        }
        let Some(order_id) = order_id else {
            return Err(self.fail(guard, CheckoutError::OrderIdMissing));
        };
        info!(order_id = %order_id, "Order created");

        self.complete_payment(order_id, guard).await
    }

    /// Retry the payment step for an order created by a failed attempt.
    ///
    /// # Errors
    ///
    /// - `AlreadyPending` if an order is in flight
    /// - `NothingToResume` unless the last attempt failed after creating
    ///   an order
    /// - `Remote` if the payment session cannot be created
    #[instrument(skip(self))]
    pub async fn resume_payment(&self) -> Result<CheckoutOutcome, CheckoutError> {
        let (order_id, guard) = {
            let mut state = self.lock();
            if state.status.is_pending() {
                return Err(CheckoutError::AlreadyPending);
            }
            let order_id = match (&state.status, &state.last_order_id) {
                (OrderStatus::Failed, Some(id)) => id.clone(),
                _ => return Err(CheckoutError::NothingToResume),
            };
            state.status = OrderStatus::Pending;
            state.error = None;
            (order_id, PendingGuard::arm(&self.inner.state))
        };
        info!(order_id = %order_id, "Resuming payment");

        self.complete_payment(order_id, guard).await
    }

    /// Reset to idle. Refused (returns `false`) while an order is pending.
    pub fn clear(&self) -> bool {
        let mut state = self.lock();
        if state.status.is_pending() {
            return false;
        }
        *state = OrderState::default();
        true
    }

    /// Copy of the current order state.
    #[must_use]
    pub fn snapshot(&self) -> OrderState {
        self.lock().clone()
    }

    #[must_use]
    pub fn status(&self) -> OrderStatus {
        self.lock().status
    }

    /// Id of the last order created remotely, if still retained.
    #[must_use]
    pub fn last_order_id(&self) -> Option<OrderId> {
        self.lock().last_order_id.clone()
    }

    /// Guard, validate, and move to pending atomically.
    fn begin_order(
        &self,
        lines: &[LineItem],
        billing: &BillingDetails,
    ) -> Result<(OrderPayload, PendingGuard<'_>), CheckoutError> {
        let mut state = self.lock();
        if state.status.is_pending() {
            warn!("Order already pending; ignoring new request");
            return Err(CheckoutError::AlreadyPending);
        }
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }
        billing.validate()?;

        let payload = OrderPayload::from_lines(lines, billing.shipping_address());
        *state = OrderState {
            status: OrderStatus::Pending,
            draft: Some(payload.clone()),
            ..OrderState::default()
        };
        Ok((payload, PendingGuard::arm(&self.inner.state)))
    }

    async fn complete_payment(
        &self,
        order_id: OrderId,
        guard: PendingGuard<'_>,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let session = match self.inner.api.create_checkout_session(&order_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!(order_id = %order_id, "Order created but payment session failed");
                return Err(self.fail(guard, e.into()));
            }
        };

        guard.disarm();
        self.inner.cart.clear();
        *self.lock() = OrderState::default();

        let action = session
            .redirect_url
            .clone()
            .map_or(TerminalAction::NavigateHome, TerminalAction::Redirect);
        info!(order_id = %order_id, action = ?action, "Order completed");

        Ok(CheckoutOutcome {
            order_id,
            session,
            action,
        })
    }

    fn fail(&self, guard: PendingGuard<'_>, error: CheckoutError) -> CheckoutError {
        guard.disarm();
        warn!(error = %error, "Order failed");
        let mut state = self.lock();
        state.status = OrderStatus::Failed;
        state.error = Some(error.user_message());
        error
    }

    fn lock(&self) -> MutexGuard<'_, OrderState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks the attempt failed if its future is dropped while still pending.
///
/// Every exit path that settles the state calls [`PendingGuard::disarm`]
/// first, with no await point in between.
struct PendingGuard<'a> {
    state: &'a Mutex<OrderState>,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    const fn arm(state: &'a Mutex<OrderState>) -> Self {
        Self { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.status.is_pending() {
            warn!("Order attempt dropped while pending");
            state.status = OrderStatus::Failed;
            state.error = Some(CheckoutError::Interrupted.to_string());
        }
    }
}
