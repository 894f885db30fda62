/// Integration tests against real storage backends
mod basic_integration;
mod chat_transcripts;
mod reminders;
