pub mod availability;
pub mod booking;
pub mod ledger;

pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use ledger::AppointmentLedger;
