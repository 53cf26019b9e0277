use gtmscout_core::domain::agency::{AgencyMatch, AgencySearchQuery};
use gtmscout_core::domain::confirmation::ConfirmationRequest;
use gtmscout_core::domain::requirements::{Category, FieldName, Requirements};
use gtmscout_core::errors::DomainError;
use gtmscout_core::reference::{industry_data, IndustryData, ToolInfo};
use serde::Serialize;
use uuid::Uuid;

use crate::confirmations::ConfirmationTracker;
use crate::conversation::Extraction;
use crate::merge::apply_updates;

/// Progress at which agency matching starts.
pub const MATCHING_THRESHOLD_PERCENT: u8 = 40;

const FALLBACK_SPECIALIZATIONS: [&str; 2] = ["B2B Marketing", "GTM"];
const B2B_CATEGORY_TAG: &str = "B2B Marketing Agency";
const MAX_IDENTIFIER_LEN: usize = 64;

/// Memory identifiers of a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionIds {
    pub user_id: String,
    pub thread_id: String,
}

impl SessionIds {
    pub fn new(user_id: Option<String>, thread_id: Option<String>) -> Self {
        Self {
            user_id: user_id.unwrap_or_else(|| generate_id("user")),
            thread_id: thread_id.unwrap_or_else(|| generate_id("thread")),
        }
    }

    /// Like [`SessionIds::new`], but rejects caller-supplied ids that are not safe to place in
    /// a URL path segment.
    pub fn parse(
        user_id: Option<String>,
        thread_id: Option<String>,
    ) -> Result<Self, DomainError> {
        for (kind, value) in [("user_id", &user_id), ("thread_id", &thread_id)] {
            if let Some(value) = value {
                if !is_valid_identifier(value) {
                    return Err(DomainError::InvalidIdentifier {
                        kind: kind.to_string(),
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(Self::new(user_id, thread_id))
    }
}

fn is_valid_identifier(value: &str) -> bool {
    (1..=MAX_IDENTIFIER_LEN).contains(&value.len())
        && value.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
}

fn generate_id(prefix: &str) -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &simple[..8])
}

/// All state accumulated over one conversation.
#[derive(Clone, Debug)]
pub struct GtmSession {
    ids: SessionIds,
    requirements: Requirements,
    confirmations: ConfirmationTracker,
    matched_agencies: Vec<AgencyMatch>,
    industry_data: Option<IndustryData>,
    recognized_tools: Vec<ToolInfo>,
    progress_percent: u8,
}

/// Serialisable view of a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub user_id: String,
    pub thread_id: String,
    pub requirements: Requirements,
    pub progress_percent: u8,
    pub industry_data: Option<IndustryData>,
    pub recognized_tools: Vec<ToolInfo>,
    pub matched_agencies: Vec<AgencyMatch>,
    pub pending_confirmations: Vec<ConfirmationRequest>,
    pub confirmed_fields: Vec<FieldName>,
}

impl GtmSession {
    pub fn new(ids: SessionIds) -> Self {
        Self {
            ids,
            requirements: Requirements::default(),
            confirmations: ConfirmationTracker::new(),
            matched_agencies: Vec::new(),
            industry_data: None,
            recognized_tools: Vec::new(),
            progress_percent: 0,
        }
    }

    pub fn ids(&self) -> &SessionIds {
        &self.ids
    }

    pub fn thread_id(&self) -> &str {
        &self.ids.thread_id
    }

    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn industry_data(&self) -> Option<&IndustryData> {
        self.industry_data.as_ref()
    }

    pub fn recognized_tools(&self) -> &[ToolInfo] {
        &self.recognized_tools
    }

    pub fn matched_agencies(&self) -> &[AgencyMatch] {
        &self.matched_agencies
    }

    pub fn pending_confirmations(&self) -> &[ConfirmationRequest] {
        self.confirmations.pending()
    }

    pub fn confirmed_fields(&self) -> &[FieldName] {
        self.confirmations.confirmed()
    }

    /// Folds one extraction into the session and returns the confirmations it raised.
    pub fn record_extraction(&mut self, extraction: &Extraction) -> Vec<ConfirmationRequest> {
        if let Some(data) = &extraction.industry_data {
            self.industry_data = Some(data.clone());
        }
        for tool in &extraction.tools {
            if !self.recognized_tools.iter().any(|known| known.name == tool.name) {
                self.recognized_tools.push(tool.clone());
            }
        }

        let emitted = apply_updates(&mut self.requirements, &extraction.fields);
        self.progress_percent = self.requirements.completeness_percent();
        self.confirmations.enqueue(emitted.iter().cloned());
        emitted
    }

    pub fn confirm(&mut self, field: FieldName) -> bool {
        self.confirmations.confirm(field)
    }

    /// Replaces `field` with a validated user value, then confirms it.
    ///
    /// The session is left unchanged when the value does not fit the field.
    pub fn correct(&mut self, field: FieldName, value: &str) -> Result<(), DomainError> {
        let mut requirements = self.requirements.clone();
        requirements.apply_correction(field, value)?;
        self.requirements = requirements;
        self.progress_percent = self.requirements.completeness_percent();

        if field == FieldName::Industry {
            self.industry_data = self.requirements.industry.as_deref().and_then(industry_data);
        }

        self.confirmations.confirm(field);
        Ok(())
    }

    pub fn qualifies_for_matching(&self) -> bool {
        self.progress_percent >= MATCHING_THRESHOLD_PERCENT
    }

    /// Matching-service parameters derived from the current requirements.
    pub fn agency_query(&self, limit: u32) -> AgencySearchQuery {
        let is_b2b_saas = self.requirements.category == Some(Category::B2bSaas);

        let mut specializations = self.requirements.needed_specializations.clone();
        if specializations.is_empty() && is_b2b_saas {
            specializations = FALLBACK_SPECIALIZATIONS.iter().map(|s| s.to_string()).collect();
        }

        let category_tags =
            if is_b2b_saas { vec![B2B_CATEGORY_TAG.to_string()] } else { Vec::new() };

        AgencySearchQuery {
            specializations,
            category_tags,
            service_areas: Vec::new(),
            max_budget: self.requirements.budget,
            limit,
        }
    }

    /// Stores the latest matching batch, replacing the previous one.
    pub fn replace_agencies(&mut self, agencies: Vec<AgencyMatch>) {
        self.matched_agencies = agencies;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user_id: self.ids.user_id.clone(),
            thread_id: self.ids.thread_id.clone(),
            requirements: self.requirements.clone(),
            progress_percent: self.progress_percent,
            industry_data: self.industry_data.clone(),
            recognized_tools: self.recognized_tools.clone(),
            matched_agencies: self.matched_agencies.clone(),
            pending_confirmations: self.confirmations.pending().to_vec(),
            confirmed_fields: self.confirmations.confirmed().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use gtmscout_core::domain::requirements::{FieldName, StrategyType};
    use gtmscout_core::errors::DomainError;

    use super::{GtmSession, SessionIds};
    use crate::conversation::ConversationExtractor;

    fn session() -> GtmSession {
        GtmSession::new(SessionIds::new(Some("user_test".into()), Some("thread_test".into())))
    }

    fn process(session: &mut GtmSession, message: &str) {
        let extraction = ConversationExtractor::new().extract(message);
        session.record_extraction(&extraction);
    }

    #[test]
    fn generated_ids_have_prefix_and_eight_hex_chars() {
        let ids = SessionIds::new(None, None);
        let (prefix, suffix) = ids.thread_id.split_at("thread_".len());
        assert_eq!(prefix, "thread_");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(ids.user_id.starts_with("user_"));
        assert_ne!(SessionIds::new(None, None), ids);
    }

    #[test]
    fn supplied_ids_must_be_path_safe() {
        let ids = SessionIds::parse(Some("user-42".into()), Some("thread_ab12".into()))
            .expect("valid ids");
        assert_eq!(ids.user_id, "user-42");
        assert_eq!(ids.thread_id, "thread_ab12");
        assert!(SessionIds::parse(None, None).expect("generated ids").user_id.starts_with("user_"));

        let too_long = "a".repeat(65);
        for bad in ["", "a/b", "x?y=1", "thread id", "../etc", too_long.as_str()] {
            let error = SessionIds::parse(None, Some(bad.to_string())).expect_err(bad);
            assert!(matches!(
                error,
                DomainError::InvalidIdentifier { ref kind, ref value }
                    if kind == "thread_id" && value == bad
            ));
        }
        assert!(matches!(
            SessionIds::parse(Some("user#1".into()), None),
            Err(DomainError::InvalidIdentifier { ref kind, .. }) if kind == "user_id"
        ));
    }

    #[test]
    fn completeness_never_drops_across_additive_messages() {
        let mut session = session();
        let messages = [
            "hello there",
            "we're in fintech",
            "we're sales-led",
            "we need SEO help",
            "fintech again",
            "budget is $25k",
            "hello there",
        ];

        let progress = messages
            .iter()
            .map(|message| {
                process(&mut session, message);
                session.progress_percent()
            })
            .collect::<Vec<_>>();

        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]), "{progress:?}");
        assert_eq!(progress, vec![0, 14, 29, 43, 43, 57, 57]);
    }

    #[test]
    fn records_extraction_side_channels() {
        let mut session = session();
        process(&mut session, "B2B SaaS in gaming using HubSpot and Clay");
        process(&mut session, "HubSpot is our CRM, also Instantly");

        let names =
            session.recognized_tools().iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["HubSpot", "Clay", "Instantly"]);
        assert_eq!(session.industry_data().map(|data| data.industry.as_str()), Some("Gaming"));
        assert_eq!(session.requirements().tech_stack, vec!["HubSpot", "Clay", "Instantly"]);
    }

    #[test]
    fn message_without_signal_leaves_session_untouched() {
        let mut session = session();
        process(&mut session, "We're in fintech with a $30k budget");
        let before = session.snapshot();

        process(&mut session, "hello there");

        assert_eq!(session.snapshot(), before);
        assert_eq!(session.pending_confirmations().len(), 2);
    }

    #[test]
    fn progress_tracks_completeness() {
        let mut session = session();
        process(&mut session, "We're a sales-led B2B SaaS company with a $20k budget");
        assert_eq!(session.progress_percent(), 43);
        assert!(session.qualifies_for_matching());

        let query = session.agency_query(5);
        assert_eq!(query.specializations, vec!["B2B Marketing", "GTM"]);
        assert_eq!(query.category_tags, vec!["B2B Marketing Agency"]);
        assert_eq!(query.max_budget, Some(20_000));
        assert_eq!(query.limit, 5);
        assert!(query.service_areas.is_empty());
    }

    #[test]
    fn query_uses_extracted_specializations_without_tags_outside_b2b_saas() {
        let mut session = session();
        process(&mut session, "DTC brand, product led, need SEO help, budget 15k");

        let query = session.agency_query(3);
        assert_eq!(query.specializations, vec!["plg", "brand", "seo"]);
        assert!(query.category_tags.is_empty());
        assert_eq!(query.max_budget, Some(15_000));
    }

    #[test]
    fn correction_validates_then_confirms() {
        let mut session = session();
        process(&mut session, "We're product led");
        assert_eq!(session.pending_confirmations().len(), 1);

        session.correct(FieldName::StrategyType, "sales-led").expect("valid correction");

        assert_eq!(session.requirements().strategy_type, Some(StrategyType::SalesLed));
        assert!(session.pending_confirmations().is_empty());
        assert_eq!(session.confirmed_fields(), &[FieldName::StrategyType]);
    }

    #[test]
    fn rejected_correction_changes_nothing() {
        let mut session = session();
        process(&mut session, "We're product led");
        let before = session.snapshot();

        let error = session.correct(FieldName::StrategyType, "telepathy").expect_err("invalid");

        assert!(matches!(error, DomainError::InvalidFieldValue { .. }));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn correcting_industry_refreshes_market_data_and_progress() {
        let mut session = session();
        process(&mut session, "we build games");
        assert_eq!(session.progress_percent(), 14);

        session.correct(FieldName::Industry, "EdTech").expect("valid correction");
        assert_eq!(session.industry_data().map(|data| data.industry.as_str()), Some("EdTech"));

        session.correct(FieldName::CompanyName, "Acme").expect("valid correction");
        assert_eq!(session.progress_percent(), 29);

        session.correct(FieldName::Industry, "agritech").expect("valid correction");
        assert!(session.industry_data().is_none());
    }
}
