//! Type definitions for the checkout flow

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Currency code (ISO 4217).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Currency(pub String);

impl Currency {
    /// Creates a new currency code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Kenyan Shilling.
    #[must_use]
    pub fn kes() -> Self {
        Self("KES".to_string())
    }

    /// US Dollar.
    #[must_use]
    pub fn usd() -> Self {
        Self("USD".to_string())
    }
}

/// Price with currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit.
    pub amount:   u64,
    /// Currency code.
    pub currency: Currency,
    /// Number of decimal places.
    pub decimals: u8,
}

impl Price {
    /// Creates a new price.
    #[must_use]
    pub fn new(amount: u64, currency: Currency, decimals: u8) -> Self {
        Self { amount, currency, decimals }
    }

    /// Creates a price in Kenyan Shillings (whole units).
    #[must_use]
    pub fn kes(amount: u64) -> Self {
        Self::new(amount, Currency::kes(), 0)
    }

    /// Returns the display amount (with decimals applied).
    #[must_use]
    pub fn display_amount(&self) -> f64 {
        let divisor = 10_u64.pow(u32::from(self.decimals));
        self.amount as f64 / divisor as f64
    }

    /// Multiplies the amount by a whole number of days/units.
    #[must_use]
    pub fn times(&self, count: u32) -> Price {
        Price::new(
            self.amount.saturating_mul(u64::from(count)),
            self.currency.clone(),
            self.decimals,
        )
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::kes(0)
    }
}

/// Account identifier of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(pub Cow<'static, str>);

impl UserId {
    /// Creates a new user ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Creates a user ID from a static string slice (zero-copy).
    #[must_use]
    pub fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned booking identifier, opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookingId(String);

impl BookingId {
    /// Wraps a server-assigned booking id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bearer token obtained at sign-in.
///
/// Deliberately has no `Display` impl so tokens do not end up in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Role attached to the signed-in account.
///
/// The remote API has grown more than one role vocabulary, so this is an
/// open enumeration: unrecognized roles are preserved verbatim and land on
/// the default route with a warning instead of being silently collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRole {
    /// A renting customer.
    Customer,
    /// Back-office staff.
    Staff,
    /// Any role this client does not know about.
    Other(String),
}

impl UserRole {
    /// Parses a role string from the API.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "customer" | "user" => Self::Customer,
            "staff" | "admin" => Self::Staff,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// Post-sign-in landing route for this role.
    #[must_use]
    pub fn landing_route(&self) -> Route {
        match self {
            Self::Customer | Self::Staff => Route::VehicleSelection,
            Self::Other(raw) => {
                tracing::warn!(role = %raw, "unrecognized user role, using default route");
                Route::VehicleSelection
            },
        }
    }
}

/// Authenticated session for the current user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Signed-in user.
    pub user_id: UserId,
    /// Bearer token sent with every API request.
    pub token:   BearerToken,
    /// Role reported by the API at sign-in.
    pub role:    UserRole,
}

impl AuthSession {
    /// Creates a session from sign-in response fields.
    #[must_use]
    pub fn new(user_id: UserId, token: BearerToken, role: UserRole) -> Self {
        Self { user_id, token, role }
    }
}

/// Navigation targets the checkout flow can resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Vehicle listing / re-selection view.
    VehicleSelection,
    /// Checkout view for the current draft.
    Checkout,
    /// Sign-in view.
    SignIn,
    /// Booking confirmation view for a completed booking.
    Confirmation(BookingId),
}

/// Checkout configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Currency all quotes and charges are made in.
    pub currency:        Currency,
    /// Longest rental the platform accepts, in days.
    pub max_rental_days: u32,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self { currency: Currency::kes(), max_rental_days: 60 }
    }
}

pub mod dates;
pub mod fleet;
