use serde::Deserialize;
use serde_json::Value;

use shared_models::ClinicError;

const EMPTY_REPLY_FALLBACK: &str = "Não consegui processar sua solicitação.";

/// Closed set of decisions the model may take on a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Reply { text: String },
    RegisterPatient { full_name: String, date_of_birth: Option<String> },
    BookAppointment { date_time: String, procedure: String },
    CheckAvailability { day: Option<String> },
    ListMyAppointments,
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    action: Option<String>,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ReplyData {
    texto: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterData {
    nome: String,
    data_nascimento: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BookData {
    data_hora: String,
    procedimento: String,
}

#[derive(Debug, Deserialize)]
struct AvailabilityData {
    dia: Option<String>,
}

fn payload<T: for<'de> Deserialize<'de>>(action: &str, data: Value) -> Result<T, ClinicError> {
    // `data` may be omitted entirely for actions without parameters.
    let data = if data.is_null() { Value::Object(Default::default()) } else { data };
    serde_json::from_value(data)
        .map_err(|e| ClinicError::UnknownAction(format!("{} with malformed data: {}", action, e)))
}

impl Action {
    /// Decodes the model's `{"action": ..., "data": {...}}` object.
    pub fn from_decision(decision: Value) -> Result<Self, ClinicError> {
        let raw: RawDecision = serde_json::from_value(decision)
            .map_err(|e| ClinicError::UnknownAction(format!("undecodable decision: {}", e)))?;

        let name = raw.action.unwrap_or_default();
        match name.as_str() {
            "responder" => {
                let data: ReplyData = payload(&name, raw.data)?;
                let text = data
                    .texto
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| EMPTY_REPLY_FALLBACK.to_string());
                Ok(Action::Reply { text })
            }
            "cadastrar_paciente" => {
                let data: RegisterData = payload(&name, raw.data)?;
                Ok(Action::RegisterPatient {
                    full_name: data.nome,
                    date_of_birth: data.data_nascimento,
                })
            }
            "agendar_consulta" => {
                let data: BookData = payload(&name, raw.data)?;
                Ok(Action::BookAppointment {
                    date_time: data.data_hora,
                    procedure: data.procedimento,
                })
            }
            "consultar_horarios_disponiveis" => {
                let data: AvailabilityData = payload(&name, raw.data)?;
                Ok(Action::CheckAvailability { day: data.dia })
            }
            "consultar_meus_agendamentos" | "consultarMeusAgendamentos" => Ok(Action::ListMyAppointments),
            _ => Err(ClinicError::UnknownAction(name)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Reply { .. } => "responder",
            Action::RegisterPatient { .. } => "cadastrar_paciente",
            Action::BookAppointment { .. } => "agendar_consulta",
            Action::CheckAvailability { .. } => "consultar_horarios_disponiveis",
            Action::ListMyAppointments => "consultar_meus_agendamentos",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn decodes_every_known_action() {
        assert_eq!(
            Action::from_decision(json!({ "action": "responder", "data": { "texto": "Olá!" } })).unwrap(),
            Action::Reply { text: "Olá!".to_string() }
        );
        assert_eq!(
            Action::from_decision(json!({
                "action": "cadastrar_paciente",
                "data": { "nome": "Ana Souza", "data_nascimento": "15/08/1990" }
            }))
            .unwrap(),
            Action::RegisterPatient {
                full_name: "Ana Souza".to_string(),
                date_of_birth: Some("15/08/1990".to_string())
            }
        );
        assert_eq!(
            Action::from_decision(json!({
                "action": "agendar_consulta",
                "data": { "procedimento": "Limpeza", "data_hora": "2025-03-10T09:00:00" }
            }))
            .unwrap(),
            Action::BookAppointment {
                date_time: "2025-03-10T09:00:00".to_string(),
                procedure: "Limpeza".to_string()
            }
        );
        assert_eq!(
            Action::from_decision(json!({ "action": "consultar_horarios_disponiveis", "data": {} })).unwrap(),
            Action::CheckAvailability { day: None }
        );
        assert_eq!(
            Action::from_decision(json!({ "action": "consultar_meus_agendamentos" })).unwrap(),
            Action::ListMyAppointments
        );
    }

    #[test]
    fn camel_case_alias_is_accepted() {
        assert_eq!(
            Action::from_decision(json!({ "action": "consultarMeusAgendamentos", "data": {} })).unwrap(),
            Action::ListMyAppointments
        );
    }

    #[test]
    fn unknown_and_missing_actions_are_rejected() {
        assert_matches!(
            Action::from_decision(json!({ "action": "cancelar_consulta", "data": {} })),
            Err(ClinicError::UnknownAction(ref name)) if name == "cancelar_consulta"
        );
        assert_matches!(Action::from_decision(json!({ "data": {} })), Err(ClinicError::UnknownAction(_)));
        assert_matches!(Action::from_decision(json!("responder")), Err(ClinicError::UnknownAction(_)));
    }

    #[test]
    fn known_action_missing_required_fields_is_rejected() {
        assert_matches!(
            Action::from_decision(json!({ "action": "agendar_consulta", "data": { "procedimento": "Limpeza" } })),
            Err(ClinicError::UnknownAction(_))
        );
    }

    #[test]
    fn empty_reply_text_falls_back() {
        assert_eq!(
            Action::from_decision(json!({ "action": "responder", "data": {} })).unwrap(),
            Action::Reply { text: EMPTY_REPLY_FALLBACK.to_string() }
        );
    }
}
