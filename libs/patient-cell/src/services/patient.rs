use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};
use shared_models::ClinicError;

use crate::models::{first_name, parse_date_of_birth, Patient, PatientStatus};

const ALREADY_REGISTERED_REPLY: &str = "Você já possui um cadastro conosco.";

pub struct PatientService {
    supabase: Arc<SupabaseClient>,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Arc::new(SupabaseClient::new(config)))
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Patient>, ClinicError> {
        debug!("Looking up patient by phone: {}", phone);

        let path = format!("/rest/v1/patients?phone=eq.{}&limit=1", urlencoding::encode(phone));
        let patients: Vec<Patient> = self.supabase.select(&path).await?;

        Ok(patients.into_iter().next())
    }

    pub async fn status(&self, phone: &str) -> Result<PatientStatus, ClinicError> {
        Ok(match self.find_by_phone(phone).await? {
            Some(patient) => PatientStatus::Found { full_name: patient.full_name },
            None => PatientStatus::NotRegistered,
        })
    }

    /// Registers the caller if their phone number is not yet known.
    ///
    /// An existing registration comes back as `ClinicError::Conflict` carrying
    /// an informational reply; nothing is written in that case.
    pub async fn register_patient(
        &self,
        phone: &str,
        full_name: &str,
        date_of_birth: Option<&str>,
    ) -> Result<String, ClinicError> {
        debug!("Registering patient for phone: {}", phone);

        if self.find_by_phone(phone).await?.is_some() {
            return Err(ClinicError::Conflict(ALREADY_REGISTERED_REPLY.to_string()));
        }

        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(ClinicError::Validation(
                "Preciso do nome completo do paciente para realizar o cadastro.".to_string(),
            ));
        }

        let date_of_birth = date_of_birth
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_date_of_birth)
            .transpose()?;

        let row = json!({
            "id": Uuid::new_v4(),
            "full_name": full_name,
            "phone": phone,
            "date_of_birth": date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
        });

        let patient: Patient = match self.supabase.insert("patients", row).await {
            Ok(patient) => patient,
            Err(DatabaseError::Conflict(detail)) => {
                warn!("Concurrent registration for {} hit the unique constraint: {}", phone, detail);
                return Err(ClinicError::Conflict(ALREADY_REGISTERED_REPLY.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        info!("Patient {} registered for phone {}", patient.id, phone);

        Ok(format!(
            "Ótimo, {}! Seu cadastro foi realizado. Agora já podemos agendar sua consulta. Qual procedimento você gostaria?",
            first_name(full_name)
        ))
    }
}
