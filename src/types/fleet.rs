//! # Fleet Types
//!
//! Type definitions for the rental fleet as seen by the checkout flow.
//! Vehicles are fetched and displayed, never mutated from here.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::Price;

// ============================================================================
// CORE TYPES
// ============================================================================

/// Unique vehicle identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub Cow<'static, str>);

impl VehicleId {
    /// Creates a new vehicle ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Creates a vehicle ID from a static string slice (zero-copy).
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

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Vehicle status in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VehicleStatus {
    /// Listed and open for booking.
    #[default]
    Available,
    /// Currently rented out.
    Booked,
    /// Off the road for maintenance.
    InService,
    /// Removed from the fleet.
    Retired,
}

impl VehicleStatus {
    /// Whether the vehicle can be booked right now.
    #[must_use]
    pub fn is_bookable(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Fuel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelType {
    Petrol,
    Diesel,
    Hybrid,
    Electric,
}

/// Transmission type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transmission {
    Manual,
    Automatic,
}

// ============================================================================
// VEHICLE
// ============================================================================

/// Manufacturer specification of a vehicle.
#[derive(Debug, Clone)]
pub struct VehicleSpec {
    /// Manufacturer name.
    pub manufacturer: String,
    /// Model name.
    pub model:        String,
    /// Model year.
    pub year:         u16,
    /// Fuel type.
    pub fuel:         FuelType,
    /// Seating capacity.
    pub seats:        u8,
    /// Transmission type.
    pub transmission: Transmission,
    /// Feature list (air conditioning, GPS, ...).
    pub features:     Vec<String>,
}

impl VehicleSpec {
    /// Display label, e.g. "2022 Toyota Corolla".
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {} {}", self.year, self.manufacturer, self.model)
    }
}

/// Branch a vehicle is picked up from.
#[derive(Debug, Clone)]
pub struct PickupLocation {
    /// Branch name.
    pub branch:  String,
    /// Street address.
    pub address: String,
}

/// A vehicle in the rental fleet.
#[derive(Debug, Clone)]
pub struct RentalVehicle {
    /// Vehicle ID.
    pub id:         VehicleId,
    /// Manufacturer specification.
    pub spec:       VehicleSpec,
    /// Daily rental rate.
    pub daily_rate: Price,
    /// Fleet status.
    pub status:     VehicleStatus,
    /// Pick-up branch, if the vehicle is tied to one.
    pub pickup:     Option<PickupLocation>,
}

impl RentalVehicle {
    /// Whether the vehicle can be booked right now.
    #[must_use]
    pub fn is_bookable(&self) -> bool {
        self.status.is_bookable()
    }

    /// Display label for listings and the checkout summary.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.spec.display_name()
    }

    /// The small copy of this vehicle a booking draft carries, so the
    /// checkout view renders without refetching the vehicle.
    #[must_use]
    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            vehicle_id: self.id.clone(),
            label:      self.display_name(),
            daily_rate: self.daily_rate.clone(),
        }
    }
}

/// Checkout-facing snapshot of a vehicle, embedded in the booking draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSnapshot {
    /// Vehicle ID.
    pub vehicle_id: VehicleId,
    /// Display label captured at draft time.
    pub label:      String,
    /// Daily rate captured at draft time.
    pub daily_rate: Price,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;

    fn test_vehicle(status: VehicleStatus) -> RentalVehicle {
        RentalVehicle {
            id: VehicleId::new("veh-001"),
            spec: VehicleSpec {
                manufacturer: "Toyota".to_string(),
                model:        "Corolla".to_string(),
                year:         2022,
                fuel:         FuelType::Petrol,
                seats:        5,
                transmission: Transmission::Automatic,
                features:     vec!["Air conditioning".to_string()],
            },
            daily_rate: Price::new(4_500, Currency::kes(), 0),
            status,
            pickup: None,
        }
    }

    #[test]
    fn test_only_available_vehicles_are_bookable() {
        assert!(test_vehicle(VehicleStatus::Available).is_bookable());
        assert!(!test_vehicle(VehicleStatus::Booked).is_bookable());
        assert!(!test_vehicle(VehicleStatus::InService).is_bookable());
        assert!(!test_vehicle(VehicleStatus::Retired).is_bookable());
    }

    #[test]
    fn test_snapshot_captures_label_and_rate() {
        let vehicle = test_vehicle(VehicleStatus::Available);
        let snapshot = vehicle.snapshot();
        assert_eq!(snapshot.vehicle_id, vehicle.id);
        assert_eq!(snapshot.label, "2022 Toyota Corolla");
        assert_eq!(snapshot.daily_rate, vehicle.daily_rate);
    }
}
