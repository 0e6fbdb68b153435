//! Booking draft and its durable store

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{CorrelationId, DraftId};
use super::quote::RentalQuote;
use crate::errors::{CheckoutError, CheckoutResult};
use crate::types::dates::RentalPeriod;
use crate::types::fleet::{RentalVehicle, VehicleSnapshot};
use crate::types::Price;

/// The user's in-progress booking selection.
///
/// Created when dates are confirmed on the vehicle page, read back when
/// checkout loads, and deleted on successful confirmation or explicit
/// cancellation. The total is locked in when the period is chosen and only
/// recomputed when the period changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    /// Client-side draft identifier.
    pub draft_id: DraftId,
    /// Snapshot of the vehicle being booked.
    pub vehicle:  VehicleSnapshot,
    /// Requested rental period.
    pub period:   RentalPeriod,
    /// Total cost for the period.
    pub total:    Price,
}

impl BookingDraft {
    /// Creates a draft for a vehicle and period, pricing it immediately.
    pub fn new(
        vehicle: &RentalVehicle, period: RentalPeriod, today: NaiveDate, max_days: u32,
    ) -> CheckoutResult<Self> {
        if !vehicle.is_bookable() {
            return Err(CheckoutError::VehicleUnavailable(vehicle.id.to_string()));
        }
        Self::check_period(&period, today, max_days)?;

        let quote = RentalQuote::calculate(&vehicle.daily_rate, &period);
        Ok(Self {
            draft_id: DraftId::new(),
            vehicle:  vehicle.snapshot(),
            period,
            total:    quote.total,
        })
    }

    /// Returns this draft with a new period and a freshly computed total.
    ///
    /// Keeps the draft identity: changing dates edits the booking in
    /// progress, it does not start a new one.
    pub fn with_period(
        &self, period: RentalPeriod, today: NaiveDate, max_days: u32,
    ) -> CheckoutResult<Self> {
        Self::check_period(&period, today, max_days)?;

        let quote = RentalQuote::calculate(&self.vehicle.daily_rate, &period);
        Ok(Self { draft_id: self.draft_id.clone(), vehicle: self.vehicle.clone(), period, total: quote.total })
    }

    fn check_period(period: &RentalPeriod, today: NaiveDate, max_days: u32) -> CheckoutResult<()> {
        if period.starts_before(today) {
            return Err(CheckoutError::PickupInPast);
        }
        let days = period.duration_days();
        if days > max_days {
            return Err(CheckoutError::RentalTooLong { days, max: max_days });
        }
        Ok(())
    }
}

/// Booking correlation id parked while a confirmation is pending.
///
/// Lives in its own short-lived slot so the id survives a page reload during
/// a payment-provider redirect, and so retries of the same attempt reuse it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    /// Draft the correlation id belongs to.
    pub draft_id:    DraftId,
    /// Correlation id sent with every confirmation attempt for this draft.
    pub correlation: CorrelationId,
}

/// Durable client-side storage for the current booking draft.
///
/// Exactly one draft exists at a time; `save` silently overwrites. `load`
/// returns `None` for an absent or unreadable slot, never an error the
/// caller must handle: a draft that cannot be read is treated as no draft,
/// and the user is sent back to vehicle selection.
pub trait DraftStore: Send + Sync {
    /// Persists the draft, overwriting any previous one.
    fn save(&self, draft: &BookingDraft) -> CheckoutResult<()>;

    /// Loads the current draft, if one is present and readable.
    fn load(&self) -> Option<BookingDraft>;

    /// Removes the draft slot.
    fn clear(&self);

    /// Persists the pending confirmation for the current draft.
    fn save_pending(&self, pending: &PendingConfirmation) -> CheckoutResult<()>;

    /// Loads the pending confirmation, if present and readable.
    fn load_pending(&self) -> Option<PendingConfirmation>;

    /// Removes the pending-confirmation slot.
    fn clear_pending(&self);
}

/// In-memory draft store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    draft:   Mutex<Option<BookingDraft>>,
    pending: Mutex<Option<PendingConfirmation>>,
}

impl MemoryDraftStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn save(&self, draft: &BookingDraft) -> CheckoutResult<()> {
        let mut slot = self.draft.lock().map_err(|_| CheckoutError::LockError)?;
        *slot = Some(draft.clone());
        Ok(())
    }

    fn load(&self) -> Option<BookingDraft> {
        self.draft.lock().ok()?.clone()
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.draft.lock() {
            *slot = None;
        }
    }

    fn save_pending(&self, pending: &PendingConfirmation) -> CheckoutResult<()> {
        let mut slot = self.pending.lock().map_err(|_| CheckoutError::LockError)?;
        *slot = Some(pending.clone());
        Ok(())
    }

    fn load_pending(&self) -> Option<PendingConfirmation> {
        self.pending.lock().ok()?.clone()
    }

    fn clear_pending(&self) {
        if let Ok(mut slot) = self.pending.lock() {
            *slot = None;
        }
    }
}

/// File-backed draft store: one JSON file per slot under a profile
/// directory. Survives process restarts within the same profile.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    dir: PathBuf,
}

const DRAFT_FILE: &str = "booking_draft.json";
const PENDING_FILE: &str = "pending_confirmation.json";

impl FileDraftStore {
    /// Creates a store rooted at the given profile directory.
    ///
    /// The directory is created lazily on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn write_slot<T: Serialize>(&self, file: &str, value: &T) -> CheckoutResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| CheckoutError::Store(e.to_string()))?;
        let json = serde_json::to_string(value).map_err(|e| CheckoutError::Store(e.to_string()))?;
        fs::write(self.dir.join(file), json).map_err(|e| CheckoutError::Store(e.to_string()))
    }

    fn read_slot<T: for<'de> Deserialize<'de>>(&self, file: &str) -> Option<T> {
        let path = self.dir.join(file);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(slot = file, error = %e, "unreadable draft slot, treating as empty");
                return None;
            },
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(slot = file, error = %e, "malformed draft slot, treating as empty");
                None
            },
        }
    }

    fn remove_slot(&self, file: &str) {
        if let Err(e) = fs::remove_file(self.dir.join(file)) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(slot = file, error = %e, "failed to clear draft slot");
            }
        }
    }
}

impl DraftStore for FileDraftStore {
    fn save(&self, draft: &BookingDraft) -> CheckoutResult<()> {
        self.write_slot(DRAFT_FILE, draft)
    }

    fn load(&self) -> Option<BookingDraft> {
        self.read_slot(DRAFT_FILE)
    }

    fn clear(&self) {
        self.remove_slot(DRAFT_FILE);
    }

    fn save_pending(&self, pending: &PendingConfirmation) -> CheckoutResult<()> {
        self.write_slot(PENDING_FILE, pending)
    }

    fn load_pending(&self) -> Option<PendingConfirmation> {
        self.read_slot(PENDING_FILE)
    }

    fn clear_pending(&self) {
        self.remove_slot(PENDING_FILE);
    }
}
