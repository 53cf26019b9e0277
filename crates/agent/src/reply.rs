use gtmscout_core::domain::requirements::FieldName;

use crate::conversation::ExtractedFields;
use crate::session::SessionSnapshot;

const FALLBACK_REPLY: &str = "Tell me more about your business.";

/// Builds the assistant's reply for a processed message.
pub fn compose_reply(extracted: &ExtractedFields, snapshot: &SessionSnapshot) -> String {
    let mut parts = Vec::new();

    if extracted.contains(FieldName::Industry) {
        if let Some(data) = &snapshot.industry_data {
            parts.push(format!(
                "**{}** - great space! I'm seeing a {} market with {} growth.",
                data.industry, data.market_size, data.growth_rate
            ));
        }
    }

    if !snapshot.recognized_tools.is_empty() {
        let names =
            snapshot.recognized_tools.iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>();
        parts.push(format!("I see you're using {} - nice stack!", names.join(", ")));
    }

    if !snapshot.matched_agencies.is_empty() {
        parts.push(format!("Found {} agencies that could help.", snapshot.matched_agencies.len()));
    }

    if snapshot.progress_percent > 0 {
        parts.push(format!("We're {}% through requirements.", snapshot.progress_percent));
    }

    if let Some(question) = follow_up_question(snapshot) {
        parts.push(question.to_string());
    }

    if parts.is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        parts.join(" ")
    }
}

fn follow_up_question(snapshot: &SessionSnapshot) -> Option<&'static str> {
    let requirements = &snapshot.requirements;
    if requirements.target_market.is_none() {
        Some("Who's your target customer?")
    } else if requirements.budget.is_none() {
        Some("What's your marketing budget range?")
    } else if requirements.needed_specializations.is_empty() {
        Some("What kind of help are you looking for? (demand gen, ABM, content, etc.)")
    } else {
        None
    }
}
