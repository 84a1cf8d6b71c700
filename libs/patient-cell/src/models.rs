use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::ClinicError;

/// Accepted date-of-birth spellings, tried in order.
pub const DATE_OF_BIRTH_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Patient {
    pub fn first_name(&self) -> &str {
        first_name(&self.full_name)
    }
}

pub fn first_name(full_name: &str) -> &str {
    full_name.split_whitespace().next().unwrap_or(full_name)
}

/// Parses a date of birth in either `DD/MM/YYYY` or `YYYY-MM-DD`.
pub fn parse_date_of_birth(raw: &str) -> Result<NaiveDate, ClinicError> {
    let trimmed = raw.trim();
    DATE_OF_BIRTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| {
            ClinicError::Validation(
                "Formato de data inválido. Peça para o usuário fornecer no formato DD/MM/AAAA.".to_string(),
            )
        })
}

/// What the directory knows about a phone number, phrased for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientStatus {
    Found { full_name: String },
    NotRegistered,
}

impl fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientStatus::Found { full_name } => write!(f, "Paciente encontrado: {}.", full_name),
            PatientStatus::NotRegistered => write!(f, "Paciente não cadastrado."),
        }
    }
}
