pub mod clinic_time;
pub mod clock;
pub mod test_utils;

pub use clinic_time::ClinicCalendar;
pub use clock::{system_clock, Clock, FixedClock, SharedClock, SystemClock};
