//! # Remote Payments API
//!
//! Wire types and the gateway seam for the rental platform's payments API.
//! The concrete HTTP client lives in [`http`]; tests script the seam
//! directly.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::checkout::ProviderSecret;
use crate::errors::GatewayResult;
use crate::types::{BearerToken, BookingId};

pub mod http;
#[cfg(test)]
pub(crate) mod testing;

/// Payment-intent creation payload (`POST /payments/create-intent`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    /// Amount in minor currency units.
    pub amount:   u64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Correlation metadata echoed back by provider webhooks.
    pub metadata: IntentMetadata,
}

/// Metadata attached to a payment intent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentMetadata {
    /// Draft the intent pays for.
    pub draft_id:   String,
    /// Vehicle being booked.
    pub vehicle_id: String,
    /// Paying user.
    pub user_id:    String,
}

/// Card booking confirmation payload (`POST /payments/confirm`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmBookingRequest {
    /// Payment id assigned by the card provider widget.
    pub provider_payment_id:    String,
    /// Paying user.
    pub user_id:                String,
    /// Vehicle being booked.
    pub vehicle_id:             String,
    /// Client-generated idempotency key for this draft.
    pub booking_correlation_id: String,
    /// Amount in minor currency units.
    pub amount:                 u64,
    /// Pick-up date (ISO 8601).
    pub start_date:             NaiveDate,
    /// Return date (ISO 8601).
    pub end_date:               NaiveDate,
    /// Method name on the wire.
    pub payment_method:         String,
}

/// Mobile-money charge payload (`POST /payments/mpesa`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MobileMoneyChargeRequest {
    /// Subscriber number in international form.
    pub phone_number:           String,
    /// Paying user.
    pub user_id:                String,
    /// Vehicle being booked.
    pub vehicle_id:             String,
    /// Client-generated idempotency key for this draft.
    pub booking_correlation_id: String,
    /// Amount in minor currency units.
    pub amount:                 u64,
    /// Pick-up date (ISO 8601).
    pub start_date:             NaiveDate,
    /// Return date (ISO 8601).
    pub end_date:               NaiveDate,
}

/// Wallet charge payload (`POST /payments/paypal`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletChargeRequest {
    /// Paying user.
    pub user_id:                String,
    /// Vehicle being booked.
    pub vehicle_id:             String,
    /// Client-generated idempotency key for this draft.
    pub booking_correlation_id: String,
    /// Amount in minor currency units.
    pub amount:                 u64,
    /// Pick-up date (ISO 8601).
    pub start_date:             NaiveDate,
    /// Return date (ISO 8601).
    pub end_date:               NaiveDate,
}

/// Outcome of a successful intent creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentCreated {
    /// Secret the card widget mounts with.
    pub provider_secret: ProviderSecret,
}

/// Outcome of a successful booking-producing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingAccepted {
    /// Server-assigned booking id.
    pub booking_id: BookingId,
}

/// Seam to the remote payments API.
///
/// Every call carries the bearer token of the signed-in user; callers are
/// responsible for never invoking the gateway without one.
#[async_trait]
pub trait PaymentsGateway: Send + Sync {
    /// Requests a card payment session.
    async fn create_intent(
        &self, bearer: &BearerToken, request: &CreateIntentRequest,
    ) -> GatewayResult<IntentCreated>;

    /// Confirms a card booking after the provider widget completed.
    async fn confirm_booking(
        &self, bearer: &BearerToken, request: &ConfirmBookingRequest,
    ) -> GatewayResult<BookingAccepted>;

    /// Pushes a mobile-money charge; confirms the booking on success.
    async fn charge_mobile_money(
        &self, bearer: &BearerToken, request: &MobileMoneyChargeRequest,
    ) -> GatewayResult<BookingAccepted>;

    /// Runs a wallet charge; confirms the booking on success.
    async fn charge_wallet(
        &self, bearer: &BearerToken, request: &WalletChargeRequest,
    ) -> GatewayResult<BookingAccepted>;
}
