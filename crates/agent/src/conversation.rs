use std::sync::OnceLock;

use gtmscout_core::domain::requirements::{Category, FieldName, Maturity, StrategyType};
use gtmscout_core::reference::{industry_data, recognize_tools, IndustryData, ToolInfo};
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One detected value for one requirement field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldUpdate {
    Industry(String),
    Category(Category),
    Maturity(Maturity),
    Budget(u64),
    TechStack(Vec<String>),
    NeededSpecializations(Vec<String>),
    StrategyType(StrategyType),
    TargetRegions(Vec<String>),
}

impl FieldUpdate {
    pub fn field(&self) -> FieldName {
        match self {
            Self::Industry(_) => FieldName::Industry,
            Self::Category(_) => FieldName::Category,
            Self::Maturity(_) => FieldName::Maturity,
            Self::Budget(_) => FieldName::Budget,
            Self::TechStack(_) => FieldName::TechStack,
            Self::NeededSpecializations(_) => FieldName::NeededSpecializations,
            Self::StrategyType(_) => FieldName::StrategyType,
            Self::TargetRegions(_) => FieldName::TargetRegions,
        }
    }

    /// Stringified value as shown in a confirmation prompt.
    pub fn display_value(&self) -> String {
        match self {
            Self::Industry(industry) => industry.clone(),
            Self::Category(category) => category.to_string(),
            Self::Maturity(maturity) => maturity.to_string(),
            Self::Budget(amount) => amount.to_string(),
            Self::StrategyType(strategy) => strategy.to_string(),
            Self::TechStack(values)
            | Self::NeededSpecializations(values)
            | Self::TargetRegions(values) => values.join(", "),
        }
    }
}

/// Field updates detected in a single message, in detector order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    updates: Vec<FieldUpdate>,
}

impl ExtractedFields {
    fn push(&mut self, update: Option<FieldUpdate>) {
        if let Some(update) = update {
            self.updates.push(update);
        }
    }

    pub fn updates(&self) -> &[FieldUpdate] {
        &self.updates
    }

    pub fn get(&self, field: FieldName) -> Option<&FieldUpdate> {
        self.updates.iter().find(|update| update.field() == field)
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.get(field).is_some()
    }

    pub fn field_names(&self) -> Vec<FieldName> {
        self.updates.iter().map(FieldUpdate::field).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }
}

impl Serialize for ExtractedFields {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.updates.len()))?;
        for update in &self.updates {
            let key = update.field().as_str();
            match update {
                FieldUpdate::Industry(value) => map.serialize_entry(key, value)?,
                FieldUpdate::Category(value) => map.serialize_entry(key, value)?,
                FieldUpdate::Maturity(value) => map.serialize_entry(key, value)?,
                FieldUpdate::Budget(value) => map.serialize_entry(key, value)?,
                FieldUpdate::StrategyType(value) => map.serialize_entry(key, value)?,
                FieldUpdate::TechStack(values)
                | FieldUpdate::NeededSpecializations(values)
                | FieldUpdate::TargetRegions(values) => map.serialize_entry(key, values)?,
            }
        }
        map.end()
    }
}

/// Result of running every detector over one message.
///
/// Extraction never touches session state. The two lookups it performs are handed back so
/// the session can cache the industry card and grow its recognised tool list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Extraction {
    pub fields: ExtractedFields,
    pub industry_data: Option<IndustryData>,
    pub tools: Vec<ToolInfo>,
}

#[derive(Clone, Debug, Default)]
pub struct ConversationExtractor;

impl ConversationExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> Extraction {
        let message = MessageText::new(text);

        let industry = extract_industry(&message);
        let industry_data = industry.as_deref().and_then(industry_data);
        let tools = recognize_tools(text);

        let mut fields = ExtractedFields::default();
        fields.push(industry.map(FieldUpdate::Industry));
        fields.push(first_predicate_match(CATEGORY_RULES, &message).map(FieldUpdate::Category));
        fields.push(first_keyword_match(STAGE_RULES, &message).map(FieldUpdate::Maturity));
        fields.push(extract_budget(text).map(FieldUpdate::Budget));
        fields.push(
            non_empty(tools.iter().map(|tool| tool.name.clone()).collect())
                .map(FieldUpdate::TechStack),
        );
        fields.push(
            non_empty(all_keyword_matches(SPECIALIZATION_RULES, &message))
                .map(FieldUpdate::NeededSpecializations),
        );
        fields.push(
            first_predicate_match(STRATEGY_RULES, &message).map(FieldUpdate::StrategyType),
        );
        fields.push(
            non_empty(all_keyword_matches(REGION_RULES, &message)).map(FieldUpdate::TargetRegions),
        );

        Extraction { fields, industry_data, tools }
    }
}

/// Lower-cased message with whole-word phrase matching.
struct MessageText {
    lowered: String,
}

impl MessageText {
    fn new(text: &str) -> Self {
        Self { lowered: text.to_lowercase() }
    }

    /// True when `phrase` occurs with no letter or digit directly on either side.
    fn mentions(&self, phrase: &str) -> bool {
        self.lowered.match_indices(phrase).any(|(start, _)| {
            let end = start + phrase.len();
            let before = self.lowered[..start].chars().next_back();
            let after = self.lowered[end..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
    }

    fn mentions_any(&self, phrases: &[&str]) -> bool {
        phrases.iter().any(|phrase| self.mentions(phrase))
    }
}

struct KeywordRule<T> {
    value: T,
    keywords: &'static [&'static str],
}

struct PredicateRule<T> {
    value: T,
    matches: fn(&MessageText) -> bool,
}

const INDUSTRY_KEYS: &[&str] = &[
    "gaming",
    "games",
    "fintech",
    "healthcare",
    "healthtech",
    "edtech",
    "saas",
    "b2b saas",
    "ecommerce",
    "ai",
];

const CATEGORY_RULES: &[PredicateRule<Category>] = &[
    PredicateRule { value: Category::B2bSaas, matches: is_b2b_saas },
    PredicateRule { value: Category::Dtc, matches: is_direct_to_consumer },
    PredicateRule { value: Category::Enterprise, matches: is_enterprise },
    PredicateRule { value: Category::Marketplace, matches: is_marketplace },
    PredicateRule { value: Category::Consumer, matches: is_consumer },
];

const STAGE_RULES: &[KeywordRule<Maturity>] = &[
    KeywordRule { value: Maturity::Idea, keywords: &["idea", "concept", "thinking about"] },
    KeywordRule {
        value: Maturity::PreLaunch,
        keywords: &["pre-launch", "pre launch", "about to launch", "launching soon"],
    },
    KeywordRule {
        value: Maturity::Early,
        keywords: &["early stage", "just launched", "seed", "pre-seed"],
    },
    KeywordRule {
        value: Maturity::Growth,
        keywords: &["growth", "series a", "series b", "scaling"],
    },
    KeywordRule {
        value: Maturity::Scale,
        keywords: &["scale", "enterprise", "series c", "mature"],
    },
];

const SPECIALIZATION_RULES: &[KeywordRule<&str>] = &[
    KeywordRule { value: "demand gen", keywords: &["demand gen", "demand generation", "lead gen"] },
    KeywordRule { value: "abm", keywords: &["abm", "account based", "account-based"] },
    KeywordRule { value: "content", keywords: &["content", "content marketing", "blog"] },
    KeywordRule { value: "plg", keywords: &["plg", "product led", "product-led", "self-serve"] },
    KeywordRule { value: "brand", keywords: &["brand", "branding", "positioning"] },
    KeywordRule { value: "seo", keywords: &["seo", "search engine", "organic search"] },
    KeywordRule { value: "paid", keywords: &["paid", "ppc", "ads", "advertising"] },
];

const STRATEGY_RULES: &[PredicateRule<StrategyType>] = &[
    PredicateRule { value: StrategyType::Plg, matches: is_product_led },
    PredicateRule { value: StrategyType::SalesLed, matches: is_sales_led },
    PredicateRule { value: StrategyType::Hybrid, matches: is_hybrid },
];

const REGION_RULES: &[KeywordRule<&str>] = &[
    KeywordRule { value: "US", keywords: &["us", "usa", "united states", "america"] },
    KeywordRule { value: "UK", keywords: &["uk", "united kingdom", "britain"] },
    KeywordRule { value: "EUROPE", keywords: &["europe", "eu", "emea"] },
    KeywordRule { value: "APAC", keywords: &["apac", "asia", "pacific"] },
    KeywordRule { value: "GLOBAL", keywords: &["global", "worldwide", "international"] },
];

fn is_b2b_saas(text: &MessageText) -> bool {
    text.mentions("b2b") && text.mentions("saas")
}

fn is_direct_to_consumer(text: &MessageText) -> bool {
    text.mentions_any(&["dtc", "direct to consumer"])
}

fn is_enterprise(text: &MessageText) -> bool {
    text.mentions("enterprise")
}

fn is_marketplace(text: &MessageText) -> bool {
    text.mentions("marketplace")
}

fn is_consumer(text: &MessageText) -> bool {
    text.mentions("consumer")
}

fn is_product_led(text: &MessageText) -> bool {
    text.mentions_any(&["product led", "plg", "self-serve"])
}

fn is_sales_led(text: &MessageText) -> bool {
    text.mentions("sales") && text.mentions_any(&["led", "driven"])
}

fn is_hybrid(text: &MessageText) -> bool {
    text.mentions("hybrid") || (text.mentions("product") && text.mentions("sales"))
}

fn extract_industry(message: &MessageText) -> Option<String> {
    INDUSTRY_KEYS.iter().find(|key| message.mentions(key)).map(|key| (*key).to_string())
}

fn first_predicate_match<T: Copy>(rules: &[PredicateRule<T>], message: &MessageText) -> Option<T> {
    rules.iter().find(|rule| (rule.matches)(message)).map(|rule| rule.value)
}

fn first_keyword_match<T: Copy>(rules: &[KeywordRule<T>], message: &MessageText) -> Option<T> {
    rules.iter().find(|rule| message.mentions_any(rule.keywords)).map(|rule| rule.value)
}

fn all_keyword_matches(rules: &[KeywordRule<&str>], message: &MessageText) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| message.mentions_any(rule.keywords))
        .map(|rule| rule.value.to_string())
        .collect()
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

const AMOUNT: &str = r"(\d{1,3}(?:,\d{3})+|\d+)";

fn budget_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            format!(r"(?i)\${AMOUNT}\s*k?"),
            format!(r"(?i)budget\s*(?:of|is|:)?\s*\$?{AMOUNT}\s*k?"),
            format!(r"(?i){AMOUNT}\s*k\s*(?:per|/|a)?\s*(?:month|mo)"),
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("budget pattern is valid"))
        .collect()
    })
}

fn thousands_suffix() -> &'static Regex {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    SUFFIX.get_or_init(|| Regex::new(r"\d[kK]").expect("suffix pattern is valid"))
}

/// Monthly budget in whole dollars.
///
/// Only the first pattern that matches is considered. A `k` directly after any digit in the
/// message scales the amount by a thousand; otherwise amounts under 1000 are discarded.
fn extract_budget(text: &str) -> Option<u64> {
    let captures = budget_patterns().iter().find_map(|pattern| pattern.captures(text))?;
    let amount = captures.get(1)?.as_str().replace(',', "").parse::<u64>().ok()?;

    if thousands_suffix().is_match(text) {
        amount.checked_mul(1_000)
    } else {
        (amount >= 1_000).then_some(amount)
    }
}
