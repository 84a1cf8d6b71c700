use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;

use shared_config::AppConfig;

pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";
pub const SLOT_FORMAT: &str = "%H:%M";
pub const DATE_TIME_DISPLAY_FORMAT: &str = "%d/%m/%Y às %H:%M";

/// Wall-clock arithmetic in the clinic's reference zone.
///
/// Storage always holds UTC; every "which day is it" or "which slot is this"
/// question goes through here.
#[derive(Debug, Clone, Copy)]
pub struct ClinicCalendar {
    tz: Tz,
}

impl ClinicCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.clinic_timezone)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_local(now).date_naive()
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// Resolves a wall-clock reading to a single instant. Readings that fall
    /// in a DST gap or overlap have no unique answer and yield `None`.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt),
            _ => None,
        }
    }

    /// First instant of `date` in local time, or `None` outside chrono's range.
    pub fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        let midnight = date.and_time(NaiveTime::default());

        // Zones that spring forward at midnight start their day at 01:00.
        let mut candidate = midnight;
        while candidate.date() == date {
            if let Some(dt) = self.tz.from_local_datetime(&candidate).earliest() {
                return Some(dt.with_timezone(&Utc));
            }
            candidate = candidate.checked_add_signed(Duration::minutes(15))?;
        }

        None
    }

    /// Half-open `[start, end)` UTC window covering the local day.
    pub fn day_window(&self, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let next = date.checked_add_days(Days::new(1))?;
        Some((self.start_of_day(date)?, self.start_of_day(next)?))
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn format_date(date: NaiveDate) -> String {
        date.format(DATE_DISPLAY_FORMAT).to_string()
    }

    pub fn format_slot(&self, instant: DateTime<Utc>) -> String {
        self.to_local(instant).format(SLOT_FORMAT).to_string()
    }

    pub fn format_date_time(&self, instant: DateTime<Utc>) -> String {
        self.to_local(instant).format(DATE_TIME_DISPLAY_FORMAT).to_string()
    }
}

impl Default for ClinicCalendar {
    fn default() -> Self {
        Self::new(chrono_tz::America::Sao_Paulo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn sao_paulo_day_window_uses_local_midnight() {
        let calendar = ClinicCalendar::default();
        let (start, end) = calendar.day_window(date("2025-03-10")).unwrap();

        assert_eq!(start.to_rfc3339(), "2025-03-10T03:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-03-11T03:00:00+00:00");
    }

    #[test]
    fn day_window_follows_dst_in_zones_that_have_it() {
        let calendar = ClinicCalendar::new(chrono_tz::America::New_York);

        let (winter_start, _) = calendar.day_window(date("2025-01-15")).unwrap();
        let (summer_start, _) = calendar.day_window(date("2025-07-15")).unwrap();
        assert_eq!(winter_start.to_rfc3339(), "2025-01-15T05:00:00+00:00");
        assert_eq!(summer_start.to_rfc3339(), "2025-07-15T04:00:00+00:00");

        // 23-hour day when clocks spring forward.
        let (start, end) = calendar.day_window(date("2025-03-09")).unwrap();
        assert_eq!((end - start).num_hours(), 23);
    }

    #[test]
    fn midnight_gap_starts_the_day_at_the_first_valid_instant() {
        // Brazil's last DST switch happened at local midnight.
        let calendar = ClinicCalendar::default();
        let (start, _) = calendar.day_window(date("2018-11-04")).unwrap();
        assert_eq!(calendar.to_local(start).format("%H:%M").to_string(), "01:00");
    }

    #[test]
    fn day_window_at_the_end_of_the_calendar_is_none() {
        let calendar = ClinicCalendar::default();
        assert!(calendar.day_window(NaiveDate::MAX).is_none());
    }

    #[test]
    fn today_is_computed_in_local_time() {
        let calendar = ClinicCalendar::default();
        // 01:30 UTC is still the previous evening in São Paulo.
        let now = "2025-03-11T01:30:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(calendar.today(now), date("2025-03-10"));
    }

    #[test]
    fn localize_rejects_nonexistent_wall_clock() {
        let calendar = ClinicCalendar::new(chrono_tz::America::New_York);
        let gap = NaiveDateTime::parse_from_str("2025-03-09T02:30:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        assert!(calendar.localize(gap).is_none());
    }

    #[test]
    fn round_trip_through_utc_keeps_wall_clock() {
        let calendar = ClinicCalendar::default();
        let naive = NaiveDateTime::parse_from_str("2025-03-10T09:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        let stored = calendar.localize(naive).unwrap().with_timezone(&Utc);

        assert_eq!(calendar.to_local(stored).naive_local(), naive);
        assert_eq!(calendar.format_date_time(stored), "10/03/2025 às 09:00");
    }

    #[test]
    fn weekend_detection() {
        assert!(ClinicCalendar::is_weekend(date("2025-03-08")));
        assert!(ClinicCalendar::is_weekend(date("2025-03-09")));
        assert!(!ClinicCalendar::is_weekend(date("2025-03-10")));
    }
}
