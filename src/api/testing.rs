//! Scripted gateway doubles for checkout tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::{
    BookingAccepted, ConfirmBookingRequest, CreateIntentRequest, IntentCreated,
    MobileMoneyChargeRequest, PaymentsGateway, WalletChargeRequest,
};
use crate::errors::GatewayResult;
use crate::types::BearerToken;

/// A call the scripted gateway received, with its full payload.
#[derive(Debug, Clone)]
pub(crate) enum RecordedCall {
    Intent(CreateIntentRequest),
    Confirm(ConfirmBookingRequest),
    MobileMoney(MobileMoneyChargeRequest),
    Wallet(WalletChargeRequest),
}

impl RecordedCall {
    /// Booking correlation id carried by the call, if it has one.
    pub(crate) fn correlation(&self) -> Option<&str> {
        match self {
            Self::Intent(_) => None,
            Self::Confirm(r) => Some(&r.booking_correlation_id),
            Self::MobileMoney(r) => Some(&r.booking_correlation_id),
            Self::Wallet(r) => Some(&r.booking_correlation_id),
        }
    }
}

/// Gateway double that replays scripted outcomes and records every call.
///
/// `gate_next_call` turns the next call into a held one: the test learns the
/// gateway has been entered, runs its assertions, then releases the call.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    intents:  Mutex<VecDeque<GatewayResult<IntentCreated>>>,
    bookings: Mutex<VecDeque<GatewayResult<BookingAccepted>>>,
    calls:    Mutex<Vec<RecordedCall>>,
    entered:  Mutex<Option<oneshot::Sender<()>>>,
    gate:     Mutex<Option<oneshot::Receiver<()>>>,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of the next intent creation.
    pub(crate) fn push_intent(&self, outcome: GatewayResult<IntentCreated>) {
        self.intents.lock().expect("intents lock").push_back(outcome);
    }

    /// Queues the outcome of the next booking-producing call.
    pub(crate) fn push_booking(&self, outcome: GatewayResult<BookingAccepted>) {
        self.bookings.lock().expect("bookings lock").push_back(outcome);
    }

    /// Holds the next call until released.
    ///
    /// Returns `(release, entered)`: await `entered` to know the call has
    /// reached the gateway, send on `release` to let it complete.
    pub(crate) fn gate_next_call(&self) -> (oneshot::Sender<()>, oneshot::Receiver<()>) {
        let (release_tx, release_rx) = oneshot::channel();
        let (entered_tx, entered_rx) = oneshot::channel();
        *self.entered.lock().expect("entered lock") = Some(entered_tx);
        *self.gate.lock().expect("gate lock") = Some(release_rx);
        (release_tx, entered_rx)
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().expect("calls lock").push(call);
    }

    async fn pass_gate(&self) {
        let entered = self.entered.lock().expect("entered lock").take();
        if let Some(tx) = entered {
            let _ = tx.send(());
        }
        let gate = self.gate.lock().expect("gate lock").take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
    }

    fn pop_intent(&self) -> GatewayResult<IntentCreated> {
        self.intents
            .lock()
            .expect("intents lock")
            .pop_front()
            .expect("unscripted intent call")
    }

    fn pop_booking(&self) -> GatewayResult<BookingAccepted> {
        self.bookings
            .lock()
            .expect("bookings lock")
            .pop_front()
            .expect("unscripted booking call")
    }
}

#[async_trait]
impl PaymentsGateway for ScriptedGateway {
    async fn create_intent(
        &self, _bearer: &BearerToken, request: &CreateIntentRequest,
    ) -> GatewayResult<IntentCreated> {
        self.record(RecordedCall::Intent(request.clone()));
        self.pass_gate().await;
        self.pop_intent()
    }

    async fn confirm_booking(
        &self, _bearer: &BearerToken, request: &ConfirmBookingRequest,
    ) -> GatewayResult<BookingAccepted> {
        self.record(RecordedCall::Confirm(request.clone()));
        self.pass_gate().await;
        self.pop_booking()
    }

    async fn charge_mobile_money(
        &self, _bearer: &BearerToken, request: &MobileMoneyChargeRequest,
    ) -> GatewayResult<BookingAccepted> {
        self.record(RecordedCall::MobileMoney(request.clone()));
        self.pass_gate().await;
        self.pop_booking()
    }

    async fn charge_wallet(
        &self, _bearer: &BearerToken, request: &WalletChargeRequest,
    ) -> GatewayResult<BookingAccepted> {
        self.record(RecordedCall::Wallet(request.clone()));
        self.pass_gate().await;
        self.pop_booking()
    }
}
