pub mod config;
pub mod extract;

use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// Envelope printed when a command fails.
#[derive(Debug, Serialize)]
struct FailureEnvelope<'a> {
    command: &'a str,
    status: &'static str,
    error_class: &'a str,
    message: String,
}

impl CommandResult {
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    /// Pretty JSON for a successful command; serialization problems become a failure envelope.
    pub fn report<T: Serialize>(command: &str, report: &T) -> Self {
        match serde_json::to_string_pretty(report) {
            Ok(output) => Self::text(output),
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let envelope =
            FailureEnvelope { command, status: "error", error_class, message: message.into() };
        let output = serde_json::to_string(&envelope)
            .unwrap_or_else(|_| r#"{"status":"error","error_class":"serialization"}"#.to_string());
        Self { exit_code, output }
    }
}
