use std::sync::Arc;

use tracing::{debug, error, info, warn};

use appointment_cell::{describe_availability, AvailabilityService, BookingService};
use patient_cell::PatientService;
use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::ClinicError;
use shared_utils::{system_clock, ClinicCalendar, SharedClock};

use crate::actions::Action;
use crate::models::{append_exchange, ChatTurn, ConversationState, ConversationTurn};
use crate::services::llm::LlmClient;
use crate::services::prompt::{with_patient_status, ClinicProfile};

/// Runs one conversational turn: prompt, model decision, engine dispatch.
pub struct Receptionist {
    llm: LlmClient,
    patients: PatientService,
    availability: AvailabilityService,
    booking: BookingService,
    profile: ClinicProfile,
    calendar: ClinicCalendar,
    clock: SharedClock,
    max_turns: usize,
}

impl Receptionist {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_parts(config, Arc::new(SupabaseClient::new(config)), system_clock())
    }

    pub fn with_parts(config: &AppConfig, supabase: Arc<SupabaseClient>, clock: SharedClock) -> Self {
        let calendar = ClinicCalendar::from_config(config);

        Self {
            llm: LlmClient::new(config),
            patients: PatientService::with_client(Arc::clone(&supabase)),
            availability: AvailabilityService::with_parts(Arc::clone(&supabase), calendar, Arc::clone(&clock)),
            booking: BookingService::with_parts(supabase, calendar, Arc::clone(&clock)),
            profile: ClinicProfile::from_config(config),
            calendar,
            clock,
            max_turns: config.transcript_max_turns,
        }
    }

    /// Answers `message` from `phone` given the prior `history`.
    ///
    /// Never fails: engine and model problems are turned into replies. The
    /// returned transcript stores the raw user text, not the status-decorated
    /// text sent to the model.
    pub async fn respond(&self, phone: &str, message: &str, history: Vec<ChatTurn>) -> ConversationTurn {
        let state = ConversationState::from_history(history);

        let (history, model_message) = match state {
            ConversationState::InProgress(turns) => (turns, message.to_string()),
            _ => (Vec::new(), self.first_contact_message(phone, message).await),
        };

        let today = self.calendar.today(self.clock.now());
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatTurn::system(self.profile.system_prompt(today)));
        messages.extend(history.iter().cloned());
        messages.push(ChatTurn::user(model_message));

        let reply = match self.llm.decide(&messages).await {
            Ok(action) => self.dispatch(phone, action).await,
            Err(e) => {
                warn!("Model returned an unusable decision for {}: {}", phone, e);
                e.reply_text()
            }
        };

        ConversationTurn {
            transcript: append_exchange(history, message, &reply, self.max_turns),
            reply,
        }
    }

    async fn first_contact_message(&self, phone: &str, message: &str) -> String {
        match self.patients.status(phone).await {
            Ok(status) => with_patient_status(&status.to_string(), message),
            Err(e) => {
                error!("Could not look up patient status for {}: {}", phone, e);
                message.to_string()
            }
        }
    }

    async fn dispatch(&self, phone: &str, action: Action) -> String {
        let action_name = action.name();
        debug!("Dispatching action {} for {}", action_name, phone);

        let result = match action {
            Action::Reply { text } => Ok(text),
            Action::RegisterPatient { full_name, date_of_birth } => {
                self.patients
                    .register_patient(phone, &full_name, date_of_birth.as_deref())
                    .await
            }
            Action::BookAppointment { date_time, procedure } => {
                self.booking.book_appointment(phone, &date_time, &procedure).await
            }
            Action::CheckAvailability { day } => self
                .availability
                .find_availability(day.as_deref())
                .await
                .map(|found| describe_availability(found.as_ref())),
            Action::ListMyAppointments => self.booking.list_upcoming(phone).await,
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                log_action_failure(phone, action_name, &e);
                e.reply_text()
            }
        }
    }
}

fn log_action_failure(phone: &str, action: &str, err: &ClinicError) {
    match err {
        ClinicError::Database(_) | ClinicError::Upstream(_) => {
            error!("Action {} failed for {}: {}", action, phone, err)
        }
        _ => info!("Action {} for {} ended with: {}", action, phone, err),
    }
}
