use chrono::NaiveDate;
use chrono_tz::Tz;

use shared_config::AppConfig;

/// Facts about the clinic the assistant is allowed to state.
#[derive(Debug, Clone)]
pub struct ClinicProfile {
    pub clinic_name: String,
    pub assistant_name: String,
    pub procedures: Vec<String>,
    pub opening_hours: String,
    pub timezone: Tz,
}

impl Default for ClinicProfile {
    fn default() -> Self {
        Self {
            clinic_name: "Odonto-Sorriso".to_string(),
            assistant_name: "Sofia".to_string(),
            procedures: ["Limpeza", "Clareamento Dental", "Restauração", "Tratamento de Canal"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            opening_hours: "Segunda a Sexta, 09:00-12:00 e 13:00-18:00".to_string(),
            timezone: chrono_tz::America::Sao_Paulo,
        }
    }
}

impl ClinicProfile {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            clinic_name: config.clinic_name.clone(),
            assistant_name: config.assistant_name.clone(),
            timezone: config.clinic_timezone,
            ..Self::default()
        }
    }

    /// System instructions for one turn, anchored on the clinic-local `today`.
    pub fn system_prompt(&self, today: NaiveDate) -> String {
        format!(
            r#"### Papel e Objetivo
Você é a {assistant}, a recepcionista virtual da clínica "{clinic}". Sua missão é ser proativa, eficiente e humana.
A data de hoje é {today}. O fuso horário de referência é '{timezone}'.

### Regras Críticas de Comportamento
1. **Análise de Histórico OBRIGATÓRIA:** Antes de cada resposta, analise todo o histórico da conversa para entender o contexto. Não pergunte informações que já foram dadas.
2. **Início da Conversa:** A primeira mensagem do usuário virá com um status. Use esse status para uma saudação calorosa e personalizada.
3. **Fluxo de Agendamento:** Se o paciente quiser agendar, SEMPRE pergunte o procedimento ANTES de consultar horários.
4. **Formato de Resposta:** Responda SEMPRE em JSON, usando uma das actions definidas.

### Informações da Clínica
- Procedimentos: {procedures}.
- Horário: {hours}.

### Definição das Ferramentas (Actions)
- responder: {{"action": "responder", "data": {{"texto": "..."}}}}
- cadastrar_paciente: {{"action": "cadastrar_paciente", "data": {{"nome": "Nome", "data_nascimento": "DD/MM/AAAA"}}}}
- agendar_consulta: {{"action": "agendar_consulta", "data": {{"procedimento": "X", "data_hora": "AAAA-MM-DDTHH:MM:SS"}}}}
- consultar_horarios_disponiveis: {{"action": "consultar_horarios_disponiveis", "data": {{"dia": "AAAA-MM-DD"}}}}
- consultar_meus_agendamentos: {{"action": "consultar_meus_agendamentos", "data": {{}}}}
"#,
            assistant = self.assistant_name,
            clinic = self.clinic_name,
            today = today.format("%Y-%m-%d"),
            timezone = self.timezone.name(),
            procedures = self.procedures.join(", "),
            hours = self.opening_hours,
        )
    }
}

/// First-contact message: the directory status travels with the user's text.
pub fn with_patient_status(status: &str, message: &str) -> String {
    format!("Status do paciente: {} Mensagem: {}", status, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_date_zone_and_action_schema() {
        let prompt = ClinicProfile::default().system_prompt(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());

        assert!(prompt.contains("A data de hoje é 2025-03-05."));
        assert!(prompt.contains("'America/Sao_Paulo'"));
        assert!(prompt.contains("Limpeza, Clareamento Dental, Restauração, Tratamento de Canal"));
        assert!(prompt.contains(r#"{"action": "consultar_meus_agendamentos", "data": {}}"#));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn status_prefix_wraps_the_message() {
        assert_eq!(
            with_patient_status("Paciente não cadastrado.", "Oi, quero marcar uma limpeza"),
            "Status do paciente: Paciente não cadastrado. Mensagem: Oi, quero marcar uma limpeza"
        );
    }
}
