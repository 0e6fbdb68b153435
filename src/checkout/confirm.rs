//! Checkout flow and booking confirmation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use super::draft::{BookingDraft, DraftStore, PendingConfirmation};
use super::ids::CorrelationId;
use super::payment::{
    Msisdn, PaymentMethod, PaymentOrchestrator, ProviderSecret, SessionState, SessionToken,
};
use crate::api::{
    BookingAccepted, ConfirmBookingRequest, CreateIntentRequest, IntentMetadata,
    MobileMoneyChargeRequest, PaymentsGateway, WalletChargeRequest,
};
use crate::errors::{CheckoutError, CheckoutResult, GatewayResult};
use crate::types::dates::RentalPeriod;
use crate::types::fleet::RentalVehicle;
use crate::types::{AuthSession, BearerToken, BookingId, CheckoutConfig, Route, UserId};

/// What the user hands to [`CheckoutFlow::confirm`] for the selected method.
#[derive(Debug, Clone)]
pub enum PaymentInput {
    /// Card: the provider widget already took payment and reported its id.
    Card {
        /// Payment id assigned by the provider.
        provider_payment_id: String,
    },
    /// Mobile money: charge the given subscriber number.
    MobileMoney {
        /// Raw number as typed; validated before anything is sent.
        phone_number: String,
    },
    /// Wallet: no extra input.
    Wallet,
}

enum ValidatedInput {
    Card { provider_payment_id: String },
    MobileMoney { msisdn: Msisdn },
    Wallet,
}

/// A confirmed booking and where to take the user next.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    /// Server-assigned booking id.
    pub booking_id: BookingId,
    /// Navigation target, carrying the booking id.
    pub route:      Route,
}

impl Confirmation {
    fn new(booking_id: BookingId) -> Self {
        let route = Route::Confirmation(booking_id.clone());
        Self { booking_id, route }
    }
}

struct FlowState {
    auth:         Option<AuthSession>,
    orchestrator: PaymentOrchestrator,
}

/// Clears the submitting flag when a confirmation attempt ends, however it
/// ends.
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The checkout flow: draft lifecycle, payment-method orchestration, and
/// booking confirmation against the remote payments API.
///
/// One instance serves one client session. All mutable state sits behind a
/// lock that is never held across a network call; completions re-acquire it
/// and must pass the session-token check before touching anything, so a
/// response that arrives for an abandoned payment attempt is discarded.
pub struct CheckoutFlow<S, G> {
    store:      Arc<S>,
    gateway:    Arc<G>,
    config:     CheckoutConfig,
    state:      Mutex<FlowState>,
    submitting: AtomicBool,
}

impl<S: DraftStore, G: PaymentsGateway> CheckoutFlow<S, G> {
    /// Creates a flow over a draft store and payments gateway.
    pub fn new(store: Arc<S>, gateway: Arc<G>, config: CheckoutConfig) -> Self {
        Self {
            store,
            gateway,
            config,
            state: Mutex::new(FlowState { auth: None, orchestrator: PaymentOrchestrator::new() }),
            submitting: AtomicBool::new(false),
        }
    }

    fn locked(&self) -> CheckoutResult<MutexGuard<'_, FlowState>> {
        self.state.lock().map_err(|_| CheckoutError::LockError)
    }

    fn auth_parts(&self) -> CheckoutResult<(BearerToken, UserId)> {
        let state = self.locked()?;
        let auth = state.auth.as_ref().ok_or(CheckoutError::NotAuthenticated)?;
        Ok((auth.token.clone(), auth.user_id.clone()))
    }

    /// Installs the authenticated session after sign-in.
    pub fn sign_in(&self, session: AuthSession) -> CheckoutResult<()> {
        self.locked()?.auth = Some(session);
        Ok(())
    }

    /// Drops the authenticated session. The draft is preserved so checkout
    /// can resume after re-authentication.
    pub fn sign_out(&self) -> CheckoutResult<()> {
        self.locked()?.auth = None;
        Ok(())
    }

    /// Starts a draft for a vehicle and period, replacing any previous one.
    pub fn start_draft(
        &self, vehicle: &RentalVehicle, period: RentalPeriod, today: NaiveDate,
    ) -> CheckoutResult<BookingDraft> {
        let draft = BookingDraft::new(vehicle, period, today, self.config.max_rental_days)?;
        self.store.save(&draft)?;
        self.store.clear_pending();
        self.locked()?.orchestrator.reset();
        Ok(draft)
    }

    /// Changes the rental period of the current draft, repricing it.
    ///
    /// Repricing completes before this returns; if the total changed, any
    /// live payment attempt is restarted so a card session can never be
    /// consumed with a stale amount.
    pub fn update_period(
        &self, period: RentalPeriod, today: NaiveDate,
    ) -> CheckoutResult<BookingDraft> {
        let current = self.store.load().ok_or(CheckoutError::DraftMissing)?;
        let updated = current.with_period(period, today, self.config.max_rental_days)?;
        self.store.save(&updated)?;
        if updated.total != current.total {
            self.locked()?.orchestrator.invalidate();
        }
        Ok(updated)
    }

    /// Loads the draft when checkout opens.
    ///
    /// An empty or unreadable slot sends the user back to vehicle selection.
    pub fn resume(&self) -> CheckoutResult<BookingDraft> {
        self.store.load().ok_or(CheckoutError::DraftMissing)
    }

    /// Abandons the booking: clears both durable slots and the payment
    /// attempt.
    pub fn cancel(&self) {
        self.store.clear();
        self.store.clear_pending();
        if let Ok(mut state) = self.state.lock() {
            state.orchestrator.reset();
        }
    }

    /// Selects a payment method, replacing any previous attempt.
    pub fn select_method(&self, method: PaymentMethod) -> CheckoutResult<SessionToken> {
        Ok(self.locked()?.orchestrator.select(method))
    }

    /// Session state of the live payment attempt, for rendering.
    pub fn attempt_state(&self) -> CheckoutResult<Option<SessionState>> {
        Ok(self.locked()?.orchestrator.attempt().map(|a| a.state().clone()))
    }

    /// Provider secret of a ready card session, for mounting the widget.
    pub fn provider_secret(&self) -> CheckoutResult<Option<ProviderSecret>> {
        Ok(self.locked()?.orchestrator.provider_secret().cloned())
    }

    /// Requests a card payment session for the current draft.
    ///
    /// Called after selecting the card method, and again after the total
    /// changes. On failure the session lands in its error state and the
    /// user may retry.
    pub async fn initialize_card(&self) -> CheckoutResult<()> {
        let draft = self.store.load().ok_or(CheckoutError::DraftMissing)?;
        let (bearer, user_id) = self.auth_parts()?;
        let token = self.locked()?.orchestrator.begin_card_init()?;

        let request = CreateIntentRequest {
            amount:   draft.total.amount,
            currency: draft.total.currency.0.clone(),
            metadata: IntentMetadata {
                draft_id:   draft.draft_id.as_str().to_string(),
                vehicle_id: draft.vehicle.vehicle_id.as_str().to_string(),
                user_id:    user_id.as_str().to_string(),
            },
        };

        match self.gateway.create_intent(&bearer, &request).await {
            Ok(intent) => {
                if self.locked()?.orchestrator.finish_card_init(token, Ok(intent.provider_secret)) {
                    Ok(())
                } else {
                    Err(CheckoutError::AttemptSuperseded)
                }
            },
            Err(gateway_error) => {
                let error = CheckoutError::from_gateway("payment session", gateway_error, None);
                if self.locked()?.orchestrator.finish_card_init(token, Err(error.user_message())) {
                    Err(error)
                } else {
                    Err(CheckoutError::AttemptSuperseded)
                }
            },
        }
    }

    /// Confirms the booking with the selected payment method.
    ///
    /// At most one confirmation is in flight at a time; a second call while
    /// one is outstanding returns [`CheckoutError::SubmissionInFlight`]
    /// without dispatching anything.
    pub async fn confirm(&self, input: PaymentInput) -> CheckoutResult<Confirmation> {
        if self.submitting.swap(true, Ordering::SeqCst) {
            return Err(CheckoutError::SubmissionInFlight);
        }
        let _guard = SubmitGuard(&self.submitting);

        let (bearer, user_id) = self.auth_parts()?;
        let draft = self.store.load().ok_or(CheckoutError::DraftMissing)?;
        if draft.period.starts_before(today()) {
            return Err(CheckoutError::PickupInPast);
        }
        if draft.vehicle.vehicle_id.as_str().is_empty() {
            return Err(CheckoutError::MalformedIdentifier("vehicle"));
        }

        // Field-level input validation, before anything durable or remote.
        let input = match input {
            PaymentInput::Card { provider_payment_id } => {
                if provider_payment_id.trim().is_empty() {
                    return Err(CheckoutError::MalformedIdentifier("provider payment"));
                }
                ValidatedInput::Card { provider_payment_id }
            },
            PaymentInput::MobileMoney { phone_number } => {
                ValidatedInput::MobileMoney { msisdn: Msisdn::parse(&phone_number)? }
            },
            PaymentInput::Wallet => ValidatedInput::Wallet,
        };

        let correlation = self.correlation_for(&draft)?;
        if !CorrelationId::is_canonical(correlation.as_str()) {
            tracing::error!("correlation id failed its wire-format check");
            return Err(CheckoutError::MalformedIdentifier("correlation"));
        }

        match input {
            ValidatedInput::Card { provider_payment_id } => {
                self.confirm_card(&bearer, &user_id, &draft, &correlation, provider_payment_id)
                    .await
            },
            ValidatedInput::MobileMoney { msisdn } => {
                self.confirm_mobile_money(&bearer, &user_id, &draft, &correlation, msisdn).await
            },
            ValidatedInput::Wallet => {
                self.confirm_wallet(&bearer, &user_id, &draft, &correlation).await
            },
        }
    }

    /// Correlation id for this draft: created once, persisted so it
    /// survives reloads, and reused across retries of the same attempt.
    fn correlation_for(&self, draft: &BookingDraft) -> CheckoutResult<CorrelationId> {
        if let Some(pending) = self.store.load_pending() {
            if pending.draft_id == draft.draft_id {
                return Ok(pending.correlation);
            }
        }
        let correlation = CorrelationId::generate();
        self.store.save_pending(&PendingConfirmation {
            draft_id:    draft.draft_id.clone(),
            correlation: correlation.clone(),
        })?;
        Ok(correlation)
    }

    async fn confirm_card(
        &self, bearer: &BearerToken, user_id: &UserId, draft: &BookingDraft,
        correlation: &CorrelationId, provider_payment_id: String,
    ) -> CheckoutResult<Confirmation> {
        // The widget only completes against a live provider session; a
        // stale or missing one means the payment id cannot be trusted.
        if self.locked()?.orchestrator.provider_secret().is_none() {
            return Err(CheckoutError::SessionNotReady);
        }

        let request = ConfirmBookingRequest {
            provider_payment_id:    provider_payment_id.clone(),
            user_id:                user_id.as_str().to_string(),
            vehicle_id:             draft.vehicle.vehicle_id.as_str().to_string(),
            booking_correlation_id: correlation.as_str().to_string(),
            amount:                 draft.total.amount,
            start_date:             draft.period.start(),
            end_date:               draft.period.end(),
            payment_method:         PaymentMethod::Card.wire_name().to_string(),
        };

        match self.gateway.confirm_booking(bearer, &request).await {
            Ok(accepted) => self.complete(accepted.booking_id),
            Err(gateway_error) => Err(CheckoutError::from_gateway(
                "booking confirmation",
                gateway_error,
                Some(&provider_payment_id),
            )),
        }
    }

    async fn confirm_mobile_money(
        &self, bearer: &BearerToken, user_id: &UserId, draft: &BookingDraft,
        correlation: &CorrelationId, msisdn: Msisdn,
    ) -> CheckoutResult<Confirmation> {
        let token = self.locked()?.orchestrator.begin_push(msisdn.clone())?;

        let request = MobileMoneyChargeRequest {
            phone_number:           msisdn.as_str().to_string(),
            user_id:                user_id.as_str().to_string(),
            vehicle_id:             draft.vehicle.vehicle_id.as_str().to_string(),
            booking_correlation_id: correlation.as_str().to_string(),
            amount:                 draft.total.amount,
            start_date:             draft.period.start(),
            end_date:               draft.period.end(),
        };

        let outcome = self.gateway.charge_mobile_money(bearer, &request).await;
        self.apply_charge(token, "mobile money charge", outcome)
    }

    async fn confirm_wallet(
        &self, bearer: &BearerToken, user_id: &UserId, draft: &BookingDraft,
        correlation: &CorrelationId,
    ) -> CheckoutResult<Confirmation> {
        let token = self.locked()?.orchestrator.begin_wallet()?;

        let request = WalletChargeRequest {
            user_id:                user_id.as_str().to_string(),
            vehicle_id:             draft.vehicle.vehicle_id.as_str().to_string(),
            booking_correlation_id: correlation.as_str().to_string(),
            amount:                 draft.total.amount,
            start_date:             draft.period.start(),
            end_date:               draft.period.end(),
        };

        let outcome = self.gateway.charge_wallet(bearer, &request).await;
        self.apply_charge(token, "wallet charge", outcome)
    }

    fn apply_charge(
        &self, token: SessionToken, operation: &'static str,
        outcome: GatewayResult<BookingAccepted>,
    ) -> CheckoutResult<Confirmation> {
        match outcome {
            Ok(accepted) => {
                if self
                    .locked()?
                    .orchestrator
                    .finish_charge(token, Ok(accepted.booking_id.clone()))
                {
                    self.complete(accepted.booking_id)
                } else {
                    Err(CheckoutError::AttemptSuperseded)
                }
            },
            Err(gateway_error) => {
                let error = CheckoutError::from_gateway(operation, gateway_error, None);
                if self.locked()?.orchestrator.finish_charge(token, Err(error.user_message())) {
                    Err(error)
                } else {
                    Err(CheckoutError::AttemptSuperseded)
                }
            },
        }
    }

    /// Cleanup on a confirmed booking: both durable slots go, the payment
    /// attempt goes, and the caller gets the confirmation route.
    fn complete(&self, booking_id: BookingId) -> CheckoutResult<Confirmation> {
        self.store.clear();
        self.store.clear_pending();
        if let Ok(mut state) = self.state.lock() {
            state.orchestrator.reset();
        }
        tracing::info!(booking = %booking_id, "booking confirmed");
        Ok(Confirmation::new(booking_id))
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
