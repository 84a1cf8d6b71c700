// libs/appointment-cell/src/models.rs
use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_utils::ClinicCalendar;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub procedure: String,
    #[serde(default)]
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// SLOT TEMPLATE
// ==============================================================================

/// Forward search horizon, in calendar days, counted from the start date.
pub const SEARCH_HORIZON_DAYS: u64 = 30;

/// How far ahead a caller-supplied search date may lie.
pub const MAX_LOOKAHEAD_DAYS: u64 = 365;

/// Hourly slots offered every weekday, in clinic-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTemplate {
    pub first_hour: u32,
    pub last_hour: u32,
    pub lunch_hour: u32,
}

impl Default for SlotTemplate {
    fn default() -> Self {
        Self {
            first_hour: 9,
            last_hour: 17,
            lunch_hour: 12,
        }
    }
}

impl SlotTemplate {
    pub fn slots(&self) -> Vec<NaiveTime> {
        (self.first_hour..=self.last_hour)
            .filter(|hour| *hour != self.lunch_hour)
            .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
            .collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.slots()
            .iter()
            .map(|slot| slot.format(shared_utils::clinic_time::SLOT_FORMAT).to_string())
            .collect()
    }

    /// Template labels not present in `occupied`, in template order.
    pub fn free_labels(&self, occupied: &HashSet<String>) -> Vec<String> {
        self.labels()
            .into_iter()
            .filter(|label| !occupied.contains(label))
            .collect()
    }
}

/// Weekdays from `start` (inclusive) within the search horizon. Stops early
/// at the end of the representable calendar.
pub fn candidate_days(start: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0..SEARCH_HORIZON_DAYS)
        .map_while(move |offset| start.checked_add_days(Days::new(offset)))
        .filter(|day| !ClinicCalendar::is_weekend(*day))
}

// ==============================================================================
// RESULTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub free_slots: Vec<String>,
}

impl DayAvailability {
    pub fn message(&self) -> String {
        format!(
            "Encontrei horários para o dia {}: {}.",
            ClinicCalendar::format_date(self.date),
            self.free_slots.join(", ")
        )
    }
}

pub const NO_AVAILABILITY_REPLY: &str = "Não encontrei horários disponíveis nos próximos 30 dias.";

pub fn describe_availability(day: Option<&DayAvailability>) -> String {
    match day {
        Some(day) => day.message(),
        None => NO_AVAILABILITY_REPLY.to_string(),
    }
}

/// Local wall-clock formats accepted for a booking request.
pub const BOOKING_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

pub fn parse_local_date_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    BOOKING_DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    #[test]
    fn template_has_eight_slots_without_lunch() {
        let labels = SlotTemplate::default().labels();
        assert_eq!(
            labels,
            vec!["09:00", "10:00", "11:00", "13:00", "14:00", "15:00", "16:00", "17:00"]
        );
    }

    #[test]
    fn occupied_labels_are_subtracted() {
        let occupied: HashSet<String> = ["09:00", "13:00", "18:00"].iter().map(|s| s.to_string()).collect();
        let free = SlotTemplate::default().free_labels(&occupied);
        assert_eq!(free.len(), 6);
        assert!(!free.contains(&"09:00".to_string()));
        assert!(!free.contains(&"13:00".to_string()));
    }

    #[test]
    fn candidate_days_never_include_weekends() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(); // Saturday
        let days: Vec<NaiveDate> = candidate_days(start).collect();

        assert_eq!(days.first().copied(), NaiveDate::from_ymd_opt(2025, 3, 10));
        assert!(days.iter().all(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(days.iter().all(|d| *d < start + Days::new(SEARCH_HORIZON_DAYS)));
    }

    #[test]
    fn candidate_days_stop_at_the_end_of_the_calendar() {
        let days: Vec<NaiveDate> = candidate_days(NaiveDate::MAX).collect();
        assert!(days.len() <= 1);
    }

    #[test]
    fn availability_message_lists_slots() {
        let day = DayAvailability {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            free_slots: vec!["10:00".to_string(), "11:00".to_string()],
        };
        assert_eq!(day.message(), "Encontrei horários para o dia 10/03/2025: 10:00, 11:00.");
        assert_eq!(describe_availability(None), NO_AVAILABILITY_REPLY);
    }

    #[test]
    fn booking_date_time_accepts_with_and_without_seconds() {
        let full = parse_local_date_time("2025-03-10T09:00:00").unwrap();
        let short = parse_local_date_time("2025-03-10T09:00").unwrap();
        assert_eq!(full, short);
        assert!(parse_local_date_time("10/03/2025 09:00").is_none());
        assert!(parse_local_date_time("2025-03-10").is_none());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_value(AppointmentStatus::Cancelled).unwrap(), "cancelled");
        assert_eq!(AppointmentStatus::default(), AppointmentStatus::Scheduled);
    }
}
