use gtmscout_agent::session::{GtmSession, SessionIds};
use gtmscout_agent::{ConversationExtractor, ExtractedFields};
use gtmscout_core::domain::confirmation::ConfirmationRequest;
use gtmscout_core::reference::{IndustryData, ToolInfo};
use serde::Serialize;

use super::CommandResult;

const COMMAND: &str = "extract";

#[derive(Debug, Serialize)]
struct ExtractReport {
    command: &'static str,
    status: &'static str,
    extracted: ExtractedFields,
    confirmations: Vec<ConfirmationRequest>,
    progress_percent: u8,
    industry_data: Option<IndustryData>,
    recognized_tools: Vec<ToolInfo>,
    qualifies_for_matching: bool,
}

pub fn run(message: &str) -> CommandResult {
    if message.trim().is_empty() {
        return CommandResult::failure(COMMAND, "invalid_input", "message must not be empty", 2);
    }

    let mut session = GtmSession::new(SessionIds::new(None, None));
    let extraction = ConversationExtractor::new().extract(message);
    let confirmations = session.record_extraction(&extraction);

    let report = ExtractReport {
        command: COMMAND,
        status: "ok",
        extracted: extraction.fields,
        confirmations,
        progress_percent: session.progress_percent(),
        industry_data: session.industry_data().cloned(),
        recognized_tools: session.recognized_tools().to_vec(),
        qualifies_for_matching: session.qualifies_for_matching(),
    };

    CommandResult::report(COMMAND, &report)
}
