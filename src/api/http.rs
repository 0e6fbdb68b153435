//! HTTP client for the payments API

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{
    BookingAccepted, ConfirmBookingRequest, CreateIntentRequest, IntentCreated,
    MobileMoneyChargeRequest, PaymentsGateway, WalletChargeRequest,
};
use crate::checkout::ProviderSecret;
use crate::errors::{GatewayError, GatewayResult};
use crate::types::{BearerToken, BookingId};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error body shape shared by all payments endpoints.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// `POST /payments/create-intent` response.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIntentResponse {
    provider_secret: Option<String>,
    error:           Option<String>,
}

/// Response shape shared by the booking-producing endpoints.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingResponse {
    success:    bool,
    booking_id: Option<String>,
    error:      Option<String>,
}

/// Payments API client over HTTP.
pub struct HttpPaymentsGateway {
    client:   reqwest::Client,
    base_url: String,
}

impl HttpPaymentsGateway {
    /// Creates a client against the given API base URL.
    pub fn new(base_url: impl Into<String>) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Unavailable { reason: e.to_string() })?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { client, base_url })
    }

    async fn post_json<B: Serialize>(
        &self, bearer: &BearerToken, path: &str, body: &B,
    ) -> GatewayResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(bearer.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable { reason: e.to_string() })?;

        let status = response.status();
        tracing::debug!(%status, path, "payments API response");

        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Unauthorized);
        }
        if status.is_server_error() {
            return Err(GatewayError::Unavailable {
                reason: format!("{} from payment service", status),
            });
        }
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| format!("request rejected with status {}", status));
        Err(GatewayError::Rejected { message })
    }
}

fn booking_outcome(body: BookingResponse) -> GatewayResult<BookingAccepted> {
    if !body.success {
        let message = body.error.unwrap_or_else(|| "booking was rejected".to_string());
        return Err(GatewayError::Rejected { message });
    }
    match body.booking_id {
        Some(id) => Ok(BookingAccepted { booking_id: BookingId::new(id) }),
        None => Err(GatewayError::InvalidResponse("missing bookingId".to_string())),
    }
}

#[async_trait::async_trait]
impl PaymentsGateway for HttpPaymentsGateway {
    async fn create_intent(
        &self, bearer: &BearerToken, request: &CreateIntentRequest,
    ) -> GatewayResult<IntentCreated> {
        let response = self.post_json(bearer, "/payments/create-intent", request).await?;
        let body: CreateIntentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        match body.provider_secret {
            Some(secret) => Ok(IntentCreated { provider_secret: ProviderSecret::new(secret) }),
            None => {
                let message =
                    body.error.unwrap_or_else(|| "payment session was not issued".to_string());
                Err(GatewayError::Rejected { message })
            },
        }
    }

    async fn confirm_booking(
        &self, bearer: &BearerToken, request: &ConfirmBookingRequest,
    ) -> GatewayResult<BookingAccepted> {
        let response = self.post_json(bearer, "/payments/confirm", request).await?;
        let body: BookingResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        booking_outcome(body)
    }

    async fn charge_mobile_money(
        &self, bearer: &BearerToken, request: &MobileMoneyChargeRequest,
    ) -> GatewayResult<BookingAccepted> {
        let response = self.post_json(bearer, "/payments/mpesa", request).await?;
        let body: BookingResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        booking_outcome(body)
    }

    async fn charge_wallet(
        &self, bearer: &BearerToken, request: &WalletChargeRequest,
    ) -> GatewayResult<BookingAccepted> {
        let response = self.post_json(bearer, "/payments/paypal", request).await?;
        let body: BookingResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        booking_outcome(body)
    }
}
