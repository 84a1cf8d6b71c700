// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::ClinicError;
use shared_utils::{system_clock, ClinicCalendar, SharedClock};

use crate::models::parse_local_date_time;
use crate::services::ledger::AppointmentLedger;

pub struct BookingService {
    ledger: AppointmentLedger,
    patients: PatientService,
    calendar: ClinicCalendar,
    clock: SharedClock,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(
            Arc::new(SupabaseClient::new(config)),
            ClinicCalendar::from_config(config),
            system_clock(),
        )
    }

    pub fn with_parts(supabase: Arc<SupabaseClient>, calendar: ClinicCalendar, clock: SharedClock) -> Self {
        Self {
            ledger: AppointmentLedger::new(Arc::clone(&supabase)),
            patients: PatientService::with_client(supabase),
            calendar,
            clock,
        }
    }

    /// Books `procedure` for the patient registered under `phone`.
    ///
    /// `date_time` is a clinic-local `YYYY-MM-DDTHH:MM:SS` reading; it is
    /// stored as UTC. Slot occupancy is not re-checked here.
    pub async fn book_appointment(
        &self,
        phone: &str,
        date_time: &str,
        procedure: &str,
    ) -> Result<String, ClinicError> {
        debug!("Booking {} at {} for {}", procedure, date_time, phone);

        let patient = self.patients.find_by_phone(phone).await?.ok_or_else(|| {
            ClinicError::NotFound(
                "Não encontrei seu cadastro. Por favor, informe seu nome completo para começarmos.".to_string(),
            )
        })?;

        let local = parse_local_date_time(date_time)
            .and_then(|naive| self.calendar.localize(naive))
            .ok_or_else(|| {
                ClinicError::Validation("Formato de data e hora inválido. Use AAAA-MM-DDTHH:MM:SS.".to_string())
            })?;

        let procedure = procedure.trim();
        if procedure.is_empty() {
            return Err(ClinicError::Validation(
                "Qual procedimento você gostaria de agendar?".to_string(),
            ));
        }

        let appointment = self
            .ledger
            .insert(patient.id, local.with_timezone(&Utc), procedure)
            .await?;

        info!(
            "Appointment {} booked for patient {} at {}",
            appointment.id, patient.id, appointment.scheduled_at
        );

        Ok(format!(
            "Perfeito, {}! Seu agendamento para {} no dia {} foi confirmado.",
            patient.first_name(),
            procedure,
            self.calendar.format_date_time(appointment.scheduled_at)
        ))
    }

    /// Bulleted list of the caller's future scheduled appointments.
    pub async fn list_upcoming(&self, phone: &str) -> Result<String, ClinicError> {
        let patient = self.patients.find_by_phone(phone).await?.ok_or_else(|| {
            ClinicError::NotFound(
                "Não encontrei seu cadastro. Para verificar seus agendamentos, você precisa estar cadastrado. Gostaria de se cadastrar?"
                    .to_string(),
            )
        })?;

        let upcoming = self
            .ledger
            .upcoming_for_patient(patient.id, self.clock.now())
            .await?;

        if upcoming.is_empty() {
            return Ok(format!(
                "Olá, {}! Verifiquei aqui e você não possui agendamentos futuros conosco.",
                patient.first_name()
            ));
        }

        let lines: Vec<String> = upcoming
            .iter()
            .map(|appointment| {
                format!(
                    "- {} no dia {}",
                    appointment.procedure,
                    self.calendar.format_date_time(appointment.scheduled_at)
                )
            })
            .collect();

        Ok(format!(
            "Olá, {}! Encontrei os seguintes agendamentos no seu nome:\n{}",
            patient.first_name(),
            lines.join("\n")
        ))
    }
}
