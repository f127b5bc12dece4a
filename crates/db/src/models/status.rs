//! Reservation status lookup values, mirrored from `reservation_statuses`.
//!
//! No magic numbers -- every status literal goes through this enum.

/// Integer type of the lookup table primary key.
pub type StatusId = i16;

/// Lifecycle of a row in `stock_reservations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i16)]
pub enum ReservationStatus {
    /// Holding stock; counted in the unit's `locked_quantity`.
    Active = 1,
    /// Explicitly released via the unlock operation.
    Released = 2,
    /// Released by the expiry sweeper after its deadline passed.
    Expired = 3,
    /// Converted into a permanent sale at payment confirmation.
    Committed = 4,
}

impl ReservationStatus {
    pub fn id(self) -> StatusId {
        self as StatusId
    }
}
