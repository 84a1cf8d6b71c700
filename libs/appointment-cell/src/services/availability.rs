// libs/appointment-cell/src/services/availability.rs
use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::ClinicError;
use shared_utils::{system_clock, ClinicCalendar, SharedClock};

use crate::models::{candidate_days, DayAvailability, SlotTemplate, MAX_LOOKAHEAD_DAYS};
use crate::services::ledger::AppointmentLedger;

pub struct AvailabilityService {
    ledger: AppointmentLedger,
    calendar: ClinicCalendar,
    clock: SharedClock,
    template: SlotTemplate,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(
            Arc::new(SupabaseClient::new(config)),
            ClinicCalendar::from_config(config),
            system_clock(),
        )
    }

    pub fn with_parts(supabase: Arc<SupabaseClient>, calendar: ClinicCalendar, clock: SharedClock) -> Self {
        Self {
            ledger: AppointmentLedger::new(supabase),
            calendar,
            clock,
            template: SlotTemplate::default(),
        }
    }

    /// First weekday on or after the start date with at least one free slot.
    ///
    /// The start date is today (clinic-local) unless `preferred_date`
    /// (`YYYY-MM-DD`) names a later day. `Ok(None)` means the whole search
    /// horizon is booked.
    pub async fn find_availability(
        &self,
        preferred_date: Option<&str>,
    ) -> Result<Option<DayAvailability>, ClinicError> {
        let start = self.search_start(preferred_date)?;
        debug!("Searching availability from {}", start);

        for day in candidate_days(start) {
            let occupied = self.occupied_slots(day).await?;
            let free_slots = self.template.free_labels(&occupied);

            if !free_slots.is_empty() {
                info!("First open day is {} with {} free slots", day, free_slots.len());
                return Ok(Some(DayAvailability { date: day, free_slots }));
            }
        }

        info!("No free slots within the search horizon starting {}", start);
        Ok(None)
    }

    fn search_start(&self, preferred_date: Option<&str>) -> Result<NaiveDate, ClinicError> {
        let today = self.calendar.today(self.clock.now());

        let raw = match preferred_date.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => raw,
            None => return Ok(today),
        };

        let preferred = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ClinicError::Validation("Formato de data inválido. Use AAAA-MM-DD.".to_string()))?;

        if preferred < today {
            return Err(ClinicError::Validation(format!(
                "Não é possível agendar em datas passadas. A data de hoje é {}.",
                ClinicCalendar::format_date(today)
            )));
        }

        let last_bookable = today
            .checked_add_days(Days::new(MAX_LOOKAHEAD_DAYS))
            .unwrap_or(NaiveDate::MAX);
        if preferred > last_bookable {
            return Err(ClinicError::Validation(format!(
                "Só consigo consultar horários até {}. Pode escolher uma data mais próxima?",
                ClinicCalendar::format_date(last_bookable)
            )));
        }

        Ok(preferred)
    }

    /// Local `HH:MM` labels already taken on `day`.
    async fn occupied_slots(&self, day: NaiveDate) -> Result<HashSet<String>, ClinicError> {
        let (start, end) = self.calendar.day_window(day).ok_or_else(|| {
            ClinicError::Validation("Data fora do intervalo suportado. Use AAAA-MM-DD.".to_string())
        })?;
        let booked = self.ledger.active_between(start, end).await?;

        Ok(booked
            .iter()
            .map(|appointment| self.calendar.format_slot(appointment.scheduled_at))
            .collect())
    }
}
