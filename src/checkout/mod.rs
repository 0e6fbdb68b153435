//! # Booking Checkout
//!
//! The checkout flow: pricing a vehicle over a rental period, holding the
//! in-progress draft in a durable slot, driving the payment-method state
//! machines, and confirming the booking against the payments API.

mod confirm;
mod draft;
mod ids;
mod payment;
mod quote;

pub use confirm::{CheckoutFlow, Confirmation, PaymentInput};
pub use draft::{BookingDraft, DraftStore, FileDraftStore, MemoryDraftStore, PendingConfirmation};
pub use ids::{CorrelationId, DraftId};
pub use payment::{
    CardState, Msisdn, PaymentAttempt, PaymentMethod, PaymentOrchestrator, ProviderSecret,
    PushState, SessionState, SessionToken, WalletState,
};
pub use quote::RentalQuote;
