//! Error types for the checkout flow

use thiserror::Error;

use crate::types::Route;

/// Checkout-flow errors.
///
/// Every remote failure is converted into one of these at the call site;
/// callers (and the UI) never see a transport error directly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckoutError {
    /// No booking draft is in progress.
    #[error("no booking draft in progress")]
    DraftMissing,
    /// Return date is not strictly after the pick-up date.
    #[error("return date must be after the pick-up date")]
    ReturnBeforePickup,
    /// Pick-up date is in the past.
    #[error("pick-up date is in the past")]
    PickupInPast,
    /// Requested rental exceeds the maximum duration.
    #[error("rental of {days} days exceeds the maximum of {max}")]
    RentalTooLong {
        /// Requested duration.
        days: u32,
        /// Configured maximum.
        max:  u32,
    },
    /// Vehicle cannot be booked.
    #[error("vehicle {0} is not available for rental")]
    VehicleUnavailable(String),
    /// Mobile-money number failed validation.
    #[error("invalid mobile money number: {0}")]
    InvalidPhoneNumber(String),
    /// No authenticated session.
    #[error("not signed in")]
    NotAuthenticated,
    /// Payment session is not in a state that allows the requested step.
    #[error("payment session is not ready")]
    SessionNotReady,
    /// A confirmation request is already in flight.
    #[error("a confirmation request is already in flight")]
    SubmissionInFlight,
    /// The payment attempt was replaced while a request was in flight.
    #[error("payment attempt was superseded")]
    AttemptSuperseded,
    /// A client-generated identifier failed its format check.
    #[error("malformed {0} identifier")]
    MalformedIdentifier(&'static str),
    /// Lock acquisition failed.
    #[error("checkout state lock poisoned")]
    LockError,
    /// Durable draft slot could not be written.
    #[error("failed to persist booking draft: {0}")]
    Store(String),
    /// Bearer token was rejected by the remote API.
    #[error("session expired")]
    SessionExpired,
    /// Remote call failed in a way that is worth retrying.
    #[error("{operation} failed: {reason}")]
    Temporary {
        /// Operation that failed.
        operation: &'static str,
        /// Transport or server-side detail, for logs only.
        reason:    String,
    },
    /// Remote API rejected the booking itself.
    #[error("booking rejected: {reason}")]
    BookingRejected {
        /// Server-supplied rejection detail.
        reason: String,
    },
    /// Payment was taken but the booking confirmation did not land.
    #[error("payment {payment_ref} taken but booking unconfirmed")]
    PaymentUnconfirmed {
        /// Provider-assigned payment reference to quote to support.
        payment_ref: String,
    },
}

/// Remote payments API errors, prior to classification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Bearer token missing, expired, or rejected.
    #[error("request was not authorized")]
    Unauthorized,
    /// Application-level rejection (4xx with a reason).
    #[error("request rejected: {message}")]
    Rejected {
        /// Server-supplied reason.
        message: String,
    },
    /// Transport failure or 5xx; the same request may succeed later.
    #[error("payment service unavailable: {reason}")]
    Unavailable {
        /// Transport or status detail.
        reason: String,
    },
    /// Response body did not match the API contract.
    #[error("unexpected response from payment service: {0}")]
    InvalidResponse(String),
}

/// Coarse classification used to pick the user-facing treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Detected locally; fix the input inline. No network call was made.
    Validation,
    /// Network or server hiccup; the same action may be retried.
    Transient,
    /// The booking itself is no longer actionable.
    Business,
    /// Authentication is missing or expired.
    Auth,
    /// Client-side defect; retrying will not help.
    Fatal,
}

/// What the UI should offer the user after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Offer a retry of the same action.
    Retry,
    /// Send the user back to vehicle selection.
    StartOver,
    /// Send the user to the sign-in view (the draft is preserved).
    SignIn,
    /// Direct the user to support, quoting the payment reference.
    ContactSupport,
    /// Dismissible notice; nothing else to offer.
    Dismiss,
}

impl RecoveryAction {
    /// Navigation target implied by the action, if any.
    #[must_use]
    pub fn route(&self) -> Option<Route> {
        match self {
            Self::StartOver => Some(Route::VehicleSelection),
            Self::SignIn => Some(Route::SignIn),
            Self::Retry | Self::ContactSupport | Self::Dismiss => None,
        }
    }
}

impl CheckoutError {
    /// Classifies the error per the checkout error taxonomy.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::DraftMissing
            | Self::ReturnBeforePickup
            | Self::PickupInPast
            | Self::RentalTooLong { .. }
            | Self::VehicleUnavailable(_)
            | Self::InvalidPhoneNumber(_)
            | Self::SessionNotReady
            | Self::SubmissionInFlight
            | Self::AttemptSuperseded => ErrorClass::Validation,
            Self::NotAuthenticated | Self::SessionExpired => ErrorClass::Auth,
            Self::Temporary { .. } => ErrorClass::Transient,
            Self::BookingRejected { .. } | Self::PaymentUnconfirmed { .. } => ErrorClass::Business,
            Self::MalformedIdentifier(_) | Self::LockError | Self::Store(_) => ErrorClass::Fatal,
        }
    }

    /// Action the UI should offer for this error.
    #[must_use]
    pub fn recovery(&self) -> RecoveryAction {
        match self {
            Self::Temporary { .. } => RecoveryAction::Retry,
            Self::DraftMissing | Self::VehicleUnavailable(_) | Self::BookingRejected { .. } => {
                RecoveryAction::StartOver
            },
            Self::NotAuthenticated | Self::SessionExpired => RecoveryAction::SignIn,
            Self::PaymentUnconfirmed { .. } => RecoveryAction::ContactSupport,
            _ => RecoveryAction::Dismiss,
        }
    }

    /// Message suitable for showing to the user.
    ///
    /// Never exposes transport detail or identifier formats.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::DraftMissing => {
                "Your booking selection was not found. Please pick a vehicle and dates again."
                    .to_string()
            },
            Self::ReturnBeforePickup => "The return date must be after the pick-up date.".to_string(),
            Self::PickupInPast => "The pick-up date cannot be in the past.".to_string(),
            Self::RentalTooLong { max, .. } => {
                format!("Rentals are limited to {} days. Please shorten the rental period.", max)
            },
            Self::VehicleUnavailable(_) => {
                "This vehicle is no longer available. Please choose another one.".to_string()
            },
            Self::InvalidPhoneNumber(_) => {
                "Please enter a valid mobile money number, e.g. 0712 345 678.".to_string()
            },
            Self::NotAuthenticated | Self::SessionExpired => {
                "Please sign in to complete your booking.".to_string()
            },
            Self::SessionNotReady => {
                "The payment form is still loading. Please wait a moment.".to_string()
            },
            Self::SubmissionInFlight => "Your booking is already being processed.".to_string(),
            Self::AttemptSuperseded => "The payment method changed. Please confirm again.".to_string(),
            Self::Temporary { .. } => {
                "We could not reach the payment service. Please try again.".to_string()
            },
            Self::BookingRejected { .. } => {
                "This booking could not be completed. Please choose a vehicle and dates again."
                    .to_string()
            },
            Self::PaymentUnconfirmed { payment_ref } => format!(
                "Your payment was received but the booking could not be confirmed. \
                 Please contact support and quote payment reference {}.",
                payment_ref
            ),
            Self::MalformedIdentifier(_) | Self::LockError | Self::Store(_) => {
                "Something went wrong on our side. Please try again later.".to_string()
            },
        }
    }

    /// Converts a remote failure into its classified checkout error.
    ///
    /// `payment_ref` is the provider payment id when the payment has already
    /// been taken (card path); a non-retryable failure then must carry the
    /// reference instead of reading as a generic rejection.
    #[must_use]
    pub fn from_gateway(
        operation: &'static str, error: GatewayError, payment_ref: Option<&str>,
    ) -> Self {
        match error {
            GatewayError::Unauthorized => Self::SessionExpired,
            GatewayError::Unavailable { reason } => Self::Temporary { operation, reason },
            GatewayError::Rejected { message } => match payment_ref {
                Some(reference) => Self::PaymentUnconfirmed { payment_ref: reference.to_string() },
                None => Self::BookingRejected { reason: message },
            },
            GatewayError::InvalidResponse(detail) => match payment_ref {
                Some(reference) => Self::PaymentUnconfirmed { payment_ref: reference.to_string() },
                None => Self::Temporary { operation, reason: detail },
            },
        }
    }
}

/// Result type for checkout operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Result type for remote payments API calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_offer_retry() {
        let err = CheckoutError::Temporary {
            operation: "booking confirmation",
            reason:    "503 from payment service".to_string(),
        };
        assert_eq!(err.class(), ErrorClass::Transient);
        assert_eq!(err.recovery(), RecoveryAction::Retry);
        assert_eq!(err.recovery().route(), None);
    }

    #[test]
    fn test_auth_errors_route_to_sign_in() {
        let err =
            CheckoutError::from_gateway("booking confirmation", GatewayError::Unauthorized, None);
        assert_eq!(err, CheckoutError::SessionExpired);
        assert_eq!(err.class(), ErrorClass::Auth);
        assert_eq!(err.recovery().route(), Some(Route::SignIn));
    }

    #[test]
    fn test_business_rejection_routes_to_vehicle_selection() {
        let err = CheckoutError::from_gateway(
            "booking confirmation",
            GatewayError::Rejected { message: "vehicle already booked".to_string() },
            None,
        );
        assert_eq!(err.recovery(), RecoveryAction::StartOver);
        assert_eq!(err.recovery().route(), Some(Route::VehicleSelection));
    }

    #[test]
    fn test_card_rejection_keeps_the_payment_reference() {
        let err = CheckoutError::from_gateway(
            "booking confirmation",
            GatewayError::Rejected { message: "duplicate booking".to_string() },
            Some("pi_9x2"),
        );
        assert_eq!(err.recovery(), RecoveryAction::ContactSupport);
        assert!(err.user_message().contains("pi_9x2"));
    }

    #[test]
    fn test_user_messages_hide_internal_detail() {
        let err = CheckoutError::MalformedIdentifier("correlation");
        assert!(!err.user_message().contains("correlation"));
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert_eq!(err.recovery(), RecoveryAction::Dismiss);
    }
}
