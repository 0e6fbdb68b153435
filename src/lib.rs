//! # Rental Checkout
//!
//! Booking and checkout orchestration for the vehicle rental platform:
//! pricing a vehicle over a rental period, holding the in-progress booking
//! draft in a durable client-side slot, driving the payment-method state
//! machines, and confirming the booking against the remote payments API.

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod checkout;
pub mod errors;
pub mod types;

// Re-exports for public API
pub use checkout::{
    BookingDraft, CheckoutFlow, Confirmation, DraftStore, FileDraftStore, MemoryDraftStore,
    PaymentInput, PaymentMethod, RentalQuote,
};
pub use errors::{CheckoutError, CheckoutResult, ErrorClass, RecoveryAction};
pub use types::{AuthSession, CheckoutConfig, Route};
