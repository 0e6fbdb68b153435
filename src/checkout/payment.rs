//! # Payment Method Orchestration
//!
//! State machines for the three payment paths and the orchestrator that
//! owns the live payment attempt. Each path has different completion
//! semantics: the card path initializes a provider session and hands the
//! rest to the embedded widget, the mobile-money path pushes a charge to the
//! customer's phone, and the wallet path redirects through the provider.
//!
//! Asynchronous completions are delivered with the session token they were
//! started under; a token that no longer matches the live attempt means the
//! user switched methods (or changed the total) while the request was in
//! flight, and the result is discarded without touching state.

use crate::errors::{CheckoutError, CheckoutResult};
use crate::types::BookingId;

use super::ids::CorrelationId;

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Card via the embedded provider widget.
    Card,
    /// Mobile-money push to the customer's phone.
    MobileMoney,
    /// Wallet redirect through the provider.
    Wallet,
}

impl PaymentMethod {
    /// Method name on the wire.
    #[must_use]
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::MobileMoney => "mpesa",
            Self::Wallet => "paypal",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Card => write!(f, "card"),
            Self::MobileMoney => write!(f, "mobile money"),
            Self::Wallet => write!(f, "wallet"),
        }
    }
}

/// Opaque session token issued by the card provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSecret(String);

impl ProviderSecret {
    /// Wraps a provider-issued secret.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the secret for handing to the provider widget.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated mobile-money subscriber number, in international form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Msisdn(String);

impl Msisdn {
    /// Parses and normalizes a subscriber number.
    ///
    /// Accepts the local form (`07...`/`01...`, 10 digits) or the
    /// international form (`254...`, 12 digits, optional leading `+`),
    /// with spaces, dashes, and parentheses ignored. Anything else is
    /// rejected without a network call.
    pub fn parse(raw: &str) -> CheckoutResult<Self> {
        let digits: String = raw.chars().filter(|c| !matches!(c, ' ' | '-' | '(' | ')')).collect();
        let digits = digits.strip_prefix('+').unwrap_or(digits.as_str());

        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CheckoutError::InvalidPhoneNumber(raw.to_string()));
        }

        let canonical = if digits.len() == 12 && digits.starts_with("254") {
            digits.to_string()
        } else if digits.len() == 10 && (digits.starts_with("07") || digits.starts_with("01")) {
            format!("254{}", &digits[1..])
        } else {
            return Err(CheckoutError::InvalidPhoneNumber(raw.to_string()));
        };

        // Subscriber prefix after the country code must be mobile.
        if !matches!(canonical.as_bytes()[3], b'7' | b'1') {
            return Err(CheckoutError::InvalidPhoneNumber(raw.to_string()));
        }

        Ok(Self(canonical))
    }

    /// Returns the number in international form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Msisdn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SESSION STATE
// ============================================================================

/// Token identifying one payment attempt.
///
/// Minted when a method is selected; compared when an asynchronous
/// completion arrives to decide whether the result still applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionToken(u64);

/// Card path: a provider session is initialized up front, then the embedded
/// widget takes over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardState {
    /// No provider session requested yet.
    Uninitialized,
    /// Provider session request in flight.
    Initializing,
    /// Provider session issued; the widget can mount.
    Ready {
        /// Secret handed to the provider widget.
        provider_secret: ProviderSecret,
    },
    /// Session request failed; the user may retry.
    Error {
        /// User-facing notice.
        notice: String,
    },
}

/// Mobile-money path: charge is pushed to the phone after the number is
/// entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushState {
    /// Waiting for a subscriber number.
    AwaitingInput,
    /// Charge request in flight.
    Processing {
        /// Number the push was sent to.
        msisdn: Msisdn,
    },
    /// Charge accepted and booking confirmed.
    Succeeded {
        /// Booking created by the charge.
        booking_id: BookingId,
    },
    /// Charge failed; the user may retry.
    Failed {
        /// User-facing notice.
        notice: String,
    },
}

/// Wallet path: a single redirect-style charge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletState {
    /// Nothing sent yet.
    Uninitialized,
    /// Charge request in flight.
    Processing,
    /// Charge accepted and booking confirmed.
    Succeeded {
        /// Booking created by the charge.
        booking_id: BookingId,
    },
    /// Charge failed; the user may retry.
    Failed {
        /// User-facing notice.
        notice: String,
    },
}

/// Per-method session state. Each variant carries only the fields that
/// exist for its method, so code cannot read a card secret out of a wallet
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Card(CardState),
    MobileMoney(PushState),
    Wallet(WalletState),
}

impl SessionState {
    fn initial(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Card => Self::Card(CardState::Uninitialized),
            PaymentMethod::MobileMoney => Self::MobileMoney(PushState::AwaitingInput),
            PaymentMethod::Wallet => Self::Wallet(WalletState::Uninitialized),
        }
    }

    /// Method this state belongs to.
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        match self {
            Self::Card(_) => PaymentMethod::Card,
            Self::MobileMoney(_) => PaymentMethod::MobileMoney,
            Self::Wallet(_) => PaymentMethod::Wallet,
        }
    }

    /// Whether a request for this attempt is currently in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::Card(CardState::Initializing)
                | Self::MobileMoney(PushState::Processing { .. })
                | Self::Wallet(WalletState::Processing)
        )
    }
}

/// One payment attempt: a method, its session state, and the identifiers
/// tying asynchronous completions back to it.
#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    attempt_id: CorrelationId,
    state:      SessionState,
    token:      SessionToken,
}

impl PaymentAttempt {
    /// Method of this attempt.
    #[must_use]
    pub fn method(&self) -> PaymentMethod {
        self.state.method()
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Transaction tag for this attempt.
    #[must_use]
    pub fn attempt_id(&self) -> &CorrelationId {
        &self.attempt_id
    }

    /// Token completions must present to apply.
    #[must_use]
    pub fn token(&self) -> SessionToken {
        self.token
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

/// Owns the live payment attempt and enforces its state machine.
#[derive(Debug, Default)]
pub struct PaymentOrchestrator {
    attempt: Option<PaymentAttempt>,
    serial:  u64,
}

impl PaymentOrchestrator {
    /// Creates an orchestrator with no attempt selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a payment method, replacing any previous attempt.
    ///
    /// The previous attempt's token dies here: results still in flight for
    /// it will no longer match and are discarded on arrival.
    pub fn select(&mut self, method: PaymentMethod) -> SessionToken {
        self.serial += 1;
        let token = SessionToken(self.serial);
        self.attempt = Some(PaymentAttempt {
            attempt_id: CorrelationId::generate(),
            state:      SessionState::initial(method),
            token,
        });
        token
    }

    /// Restarts the current attempt after the total changed.
    ///
    /// Same method, fresh attempt id and token; a `Ready` card session is
    /// dropped because its amount is stale.
    pub fn invalidate(&mut self) {
        if let Some(attempt) = &self.attempt {
            let method = attempt.method();
            self.select(method);
        }
    }

    /// Drops the attempt entirely.
    pub fn reset(&mut self) {
        self.attempt = None;
    }

    /// Current attempt, if a method has been selected.
    #[must_use]
    pub fn attempt(&self) -> Option<&PaymentAttempt> {
        self.attempt.as_ref()
    }

    /// Provider secret of a `Ready` card session.
    #[must_use]
    pub fn provider_secret(&self) -> Option<&ProviderSecret> {
        match self.attempt.as_ref().map(PaymentAttempt::state) {
            Some(SessionState::Card(CardState::Ready { provider_secret })) => Some(provider_secret),
            _ => None,
        }
    }

    /// Starts a card session initialization.
    pub fn begin_card_init(&mut self) -> CheckoutResult<SessionToken> {
        let attempt = self.attempt.as_mut().ok_or(CheckoutError::SessionNotReady)?;
        match &attempt.state {
            SessionState::Card(CardState::Uninitialized | CardState::Error { .. }) => {
                attempt.state = SessionState::Card(CardState::Initializing);
                Ok(attempt.token)
            },
            _ => Err(CheckoutError::SessionNotReady),
        }
    }

    /// Applies the outcome of a card session initialization.
    ///
    /// Returns `false` (leaving state untouched) when the token no longer
    /// matches the live attempt.
    pub fn finish_card_init(
        &mut self, token: SessionToken, outcome: Result<ProviderSecret, String>,
    ) -> bool {
        let Some(attempt) = self.attempt.as_mut() else { return false };
        if attempt.token != token
            || !matches!(attempt.state, SessionState::Card(CardState::Initializing))
        {
            return false;
        }
        attempt.state = match outcome {
            Ok(provider_secret) => SessionState::Card(CardState::Ready { provider_secret }),
            Err(notice) => SessionState::Card(CardState::Error { notice }),
        };
        true
    }

    /// Starts a mobile-money charge for a validated number.
    pub fn begin_push(&mut self, msisdn: Msisdn) -> CheckoutResult<SessionToken> {
        let attempt = self.attempt.as_mut().ok_or(CheckoutError::SessionNotReady)?;
        match &attempt.state {
            SessionState::MobileMoney(PushState::AwaitingInput | PushState::Failed { .. }) => {
                attempt.state = SessionState::MobileMoney(PushState::Processing { msisdn });
                Ok(attempt.token)
            },
            _ => Err(CheckoutError::SessionNotReady),
        }
    }

    /// Starts a wallet charge.
    pub fn begin_wallet(&mut self) -> CheckoutResult<SessionToken> {
        let attempt = self.attempt.as_mut().ok_or(CheckoutError::SessionNotReady)?;
        match &attempt.state {
            SessionState::Wallet(WalletState::Uninitialized | WalletState::Failed { .. }) => {
                attempt.state = SessionState::Wallet(WalletState::Processing);
                Ok(attempt.token)
            },
            _ => Err(CheckoutError::SessionNotReady),
        }
    }

    /// Applies the outcome of a mobile-money or wallet charge.
    ///
    /// Returns `false` (leaving state untouched) when the token no longer
    /// matches the live attempt.
    pub fn finish_charge(
        &mut self, token: SessionToken, outcome: Result<BookingId, String>,
    ) -> bool {
        let Some(attempt) = self.attempt.as_mut() else { return false };
        if attempt.token != token {
            return false;
        }
        let next = match (&attempt.state, outcome) {
            (SessionState::MobileMoney(PushState::Processing { .. }), Ok(booking_id)) => {
                SessionState::MobileMoney(PushState::Succeeded { booking_id })
            },
            (SessionState::MobileMoney(PushState::Processing { .. }), Err(notice)) => {
                SessionState::MobileMoney(PushState::Failed { notice })
            },
            (SessionState::Wallet(WalletState::Processing), Ok(booking_id)) => {
                SessionState::Wallet(WalletState::Succeeded { booking_id })
            },
            (SessionState::Wallet(WalletState::Processing), Err(notice)) => {
                SessionState::Wallet(WalletState::Failed { notice })
            },
            _ => return false,
        };
        attempt.state = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(PaymentMethod::Card.wire_name(), "card");
        assert_eq!(PaymentMethod::MobileMoney.wire_name(), "mpesa");
        assert_eq!(PaymentMethod::Wallet.wire_name(), "paypal");
    }

    #[test]
    fn test_local_number_is_normalized() {
        let msisdn = Msisdn::parse("0712345678").expect("valid number");
        assert_eq!(msisdn.as_str(), "254712345678");
    }

    #[test]
    fn test_international_forms_are_accepted() {
        assert_eq!(Msisdn::parse("+254 712 345 678").expect("valid").as_str(), "254712345678");
        assert_eq!(Msisdn::parse("254112345678").expect("valid").as_str(), "254112345678");
        assert_eq!(Msisdn::parse("0112345678").expect("valid").as_str(), "254112345678");
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(Msisdn::parse("12345").is_err());
        assert!(Msisdn::parse("07123456789").is_err()); // one digit too many
        assert!(Msisdn::parse("0812345678").is_err()); // landline prefix
        assert!(Msisdn::parse("07 one two").is_err());
        assert!(Msisdn::parse("").is_err());
    }

    #[test]
    fn test_card_initialization_reaches_ready() {
        let mut orch = PaymentOrchestrator::new();
        orch.select(PaymentMethod::Card);
        let token = orch.begin_card_init().expect("begin init");
        assert!(orch.attempt().expect("attempt").state().is_pending());

        assert!(orch.finish_card_init(token, Ok(ProviderSecret::new("sec_123"))));
        assert_eq!(orch.provider_secret().expect("ready").as_str(), "sec_123");
    }

    #[test]
    fn test_card_error_allows_retry() {
        let mut orch = PaymentOrchestrator::new();
        orch.select(PaymentMethod::Card);
        let token = orch.begin_card_init().expect("begin init");
        assert!(orch.finish_card_init(token, Err("unreachable".to_string())));

        // A retry from the error state starts a new initialization.
        assert!(orch.begin_card_init().is_ok());
    }

    #[test]
    fn test_stale_card_result_is_discarded_after_method_switch() {
        let mut orch = PaymentOrchestrator::new();
        orch.select(PaymentMethod::Card);
        let stale = orch.begin_card_init().expect("begin init");

        orch.select(PaymentMethod::MobileMoney);
        assert!(!orch.finish_card_init(stale, Ok(ProviderSecret::new("sec_stale"))));

        // The mobile-money attempt is untouched and no secret is reachable.
        assert_eq!(
            orch.attempt().expect("attempt").state(),
            &SessionState::MobileMoney(PushState::AwaitingInput)
        );
        assert!(orch.provider_secret().is_none());
    }

    #[test]
    fn test_total_change_invalidates_a_ready_session() {
        let mut orch = PaymentOrchestrator::new();
        orch.select(PaymentMethod::Card);
        let first_id = orch.attempt().expect("attempt").attempt_id().clone();
        let token = orch.begin_card_init().expect("begin init");
        assert!(orch.finish_card_init(token, Ok(ProviderSecret::new("sec_old"))));

        orch.invalidate();

        let attempt = orch.attempt().expect("attempt");
        assert_eq!(attempt.method(), PaymentMethod::Card);
        assert_eq!(attempt.state(), &SessionState::Card(CardState::Uninitialized));
        assert_ne!(attempt.attempt_id(), &first_id);
        assert!(orch.provider_secret().is_none());
    }

    #[test]
    fn test_push_charge_lifecycle() {
        let mut orch = PaymentOrchestrator::new();
        orch.select(PaymentMethod::MobileMoney);
        let msisdn = Msisdn::parse("0712345678").expect("valid number");
        let token = orch.begin_push(msisdn).expect("begin push");

        assert!(orch.finish_charge(token, Ok(BookingId::new("b-42"))));
        assert_eq!(
            orch.attempt().expect("attempt").state(),
            &SessionState::MobileMoney(PushState::Succeeded { booking_id: BookingId::new("b-42") })
        );
    }

    #[test]
    fn test_failed_charge_allows_retry() {
        let mut orch = PaymentOrchestrator::new();
        orch.select(PaymentMethod::Wallet);
        let token = orch.begin_wallet().expect("begin wallet");
        assert!(orch.finish_charge(token, Err("declined".to_string())));

        assert!(orch.begin_wallet().is_ok());
    }

    #[test]
    fn test_begin_on_wrong_method_is_rejected() {
        let mut orch = PaymentOrchestrator::new();
        orch.select(PaymentMethod::Card);
        assert_eq!(orch.begin_wallet(), Err(CheckoutError::SessionNotReady));

        let msisdn = Msisdn::parse("0712345678").expect("valid number");
        assert_eq!(orch.begin_push(msisdn), Err(CheckoutError::SessionNotReady));
    }

    #[test]
    fn test_no_attempt_selected_is_rejected() {
        let mut orch = PaymentOrchestrator::new();
        assert_eq!(orch.begin_card_init(), Err(CheckoutError::SessionNotReady));
        assert!(!orch.finish_charge(SessionToken(1), Ok(BookingId::new("b-1"))));
    }

    #[test]
    fn test_duplicate_completion_is_ignored() {
        let mut orch = PaymentOrchestrator::new();
        orch.select(PaymentMethod::Wallet);
        let token = orch.begin_wallet().expect("begin wallet");
        assert!(orch.finish_charge(token, Ok(BookingId::new("b-1"))));
        // Same token arriving again finds no Processing state to apply to.
        assert!(!orch.finish_charge(token, Ok(BookingId::new("b-2"))));
    }
}
