pub mod inbound;
pub mod transcription;
pub mod zapi;
