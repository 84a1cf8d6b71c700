// libs/appointment-cell/src/services/ledger.rs
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use crate::models::{Appointment, AppointmentStatus};

/// Storage access for the `appointments` table.
#[derive(Clone)]
pub struct AppointmentLedger {
    supabase: Arc<SupabaseClient>,
}

fn timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl AppointmentLedger {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn insert(
        &self,
        patient_id: Uuid,
        scheduled_at: DateTime<Utc>,
        procedure: &str,
    ) -> Result<Appointment, DatabaseError> {
        let row = json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "scheduled_at": timestamp(scheduled_at),
            "procedure": procedure,
            "status": AppointmentStatus::Scheduled,
        });

        self.supabase.insert("appointments", row).await
    }

    /// Non-cancelled appointments with `start <= scheduled_at < end`.
    pub async fn active_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        debug!("Fetching active appointments between {} and {}", start, end);

        let path = format!(
            "/rest/v1/appointments?scheduled_at=gte.{}&scheduled_at=lt.{}&status=neq.{}",
            timestamp(start),
            timestamp(end),
            AppointmentStatus::Cancelled
        );
        self.supabase.select(&path).await
    }

    /// Scheduled appointments from `now` onwards, earliest first.
    pub async fn upcoming_for_patient(
        &self,
        patient_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Appointment>, DatabaseError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}&scheduled_at=gte.{}&status=eq.{}&order=scheduled_at.asc",
            patient_id,
            timestamp(now),
            AppointmentStatus::Scheduled
        );
        self.supabase.select(&path).await
    }
}
