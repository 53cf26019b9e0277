use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Number of indicators that feed the completeness score.
pub const COMPLETENESS_INDICATORS: usize = 7;

macro_rules! requirement_enum {
    (
        $(#[$meta:meta])*
        $name:ident for $field:ident { $($variant:ident => $wire:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let normalized = normalize_wire_value(value);
                Self::ALL.iter().copied().find(|candidate| candidate.as_str() == normalized).ok_or_else(
                    || DomainError::InvalidFieldValue {
                        field: FieldName::$field.as_str().to_string(),
                        value: value.to_string(),
                        expected: Self::ALL
                            .iter()
                            .map(|candidate| candidate.as_str())
                            .collect::<Vec<_>>()
                            .join("|"),
                    },
                )
            }
        }
    };
}

requirement_enum!(
    /// Business model of the company being profiled.
    Category for Category {
        B2bSaas => "b2b_saas",
        Dtc => "dtc",
        Enterprise => "enterprise",
        Marketplace => "marketplace",
        Consumer => "consumer",
    }
);

requirement_enum!(
    Maturity for Maturity {
        Idea => "idea",
        PreLaunch => "pre_launch",
        Early => "early",
        Growth => "growth",
        Scale => "scale",
    }
);

requirement_enum!(
    StrategyType for StrategyType {
        Plg => "plg",
        SalesLed => "sales_led",
        Hybrid => "hybrid",
    }
);

requirement_enum!(
    PrimaryGoal for PrimaryGoal {
        Awareness => "awareness",
        Leads => "leads",
        Revenue => "revenue",
        Expansion => "expansion",
    }
);

requirement_enum!(
    TimelineUrgency for TimelineUrgency {
        Immediate => "immediate",
        Quarter => "quarter",
        Year => "year",
        Flexible => "flexible",
    }
);

requirement_enum!(
    CompanySize for CompanySize {
        Solo => "solo",
        Small => "small",
        Medium => "medium",
        Large => "large",
        Enterprise => "enterprise",
    }
);

/// Closed set of requirement fields addressable from outside the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    CompanyName,
    CompanySize,
    Industry,
    Category,
    Maturity,
    TargetMarket,
    TargetRegions,
    StrategyType,
    Budget,
    PrimaryGoal,
    TargetKpis,
    TimelineUrgency,
    HasMarketingTeam,
    WillingToOutsource,
    NeededSpecializations,
    Challenges,
    TechStack,
}

impl FieldName {
    pub const ALL: [Self; 17] = [
        Self::CompanyName,
        Self::CompanySize,
        Self::Industry,
        Self::Category,
        Self::Maturity,
        Self::TargetMarket,
        Self::TargetRegions,
        Self::StrategyType,
        Self::Budget,
        Self::PrimaryGoal,
        Self::TargetKpis,
        Self::TimelineUrgency,
        Self::HasMarketingTeam,
        Self::WillingToOutsource,
        Self::NeededSpecializations,
        Self::Challenges,
        Self::TechStack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyName => "company_name",
            Self::CompanySize => "company_size",
            Self::Industry => "industry",
            Self::Category => "category",
            Self::Maturity => "maturity",
            Self::TargetMarket => "target_market",
            Self::TargetRegions => "target_regions",
            Self::StrategyType => "strategy_type",
            Self::Budget => "budget",
            Self::PrimaryGoal => "primary_goal",
            Self::TargetKpis => "target_kpis",
            Self::TimelineUrgency => "timeline_urgency",
            Self::HasMarketingTeam => "has_marketing_team",
            Self::WillingToOutsource => "willing_to_outsource",
            Self::NeededSpecializations => "needed_specializations",
            Self::Challenges => "challenges",
            Self::TechStack => "tech_stack",
        }
    }

    /// Human readable label, e.g. `strategy_type` becomes `Strategy Type`.
    pub fn display_label(&self) -> String {
        self.as_str()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fields whose extraction raises a soft confirmation.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Industry | Self::Category | Self::Budget | Self::StrategyType)
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Self::TargetRegions
                | Self::TargetKpis
                | Self::NeededSpecializations
                | Self::Challenges
                | Self::TechStack
        )
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == normalized)
            .ok_or_else(|| DomainError::UnknownField(value.to_string()))
    }
}

/// The structured GTM profile assembled over a conversation.
///
/// List-valued fields are never absent: an empty list means nothing was captured yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    pub company_name: Option<String>,
    pub company_size: Option<CompanySize>,
    pub industry: Option<String>,
    pub category: Option<Category>,
    pub maturity: Option<Maturity>,
    pub target_market: Option<String>,
    #[serde(default)]
    pub target_regions: Vec<String>,
    pub strategy_type: Option<StrategyType>,
    /// Monthly marketing budget in USD.
    pub budget: Option<u64>,
    pub primary_goal: Option<PrimaryGoal>,
    #[serde(default)]
    pub target_kpis: Vec<String>,
    pub timeline_urgency: Option<TimelineUrgency>,
    pub has_marketing_team: Option<bool>,
    pub willing_to_outsource: Option<bool>,
    #[serde(default)]
    pub needed_specializations: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

impl Requirements {
    pub fn completeness_indicators(&self) -> [bool; COMPLETENESS_INDICATORS] {
        [
            self.company_name.is_some(),
            self.industry.is_some() || self.category.is_some(),
            self.target_market.is_some(),
            self.strategy_type.is_some(),
            self.budget.is_some(),
            self.primary_goal.is_some(),
            !self.needed_specializations.is_empty(),
        ]
    }

    /// Share of populated indicators, rounded to the nearest whole percent.
    pub fn completeness_percent(&self) -> u8 {
        let filled = self.completeness_indicators().iter().filter(|filled| **filled).count();
        ((filled as f64 / COMPLETENESS_INDICATORS as f64) * 100.0).round() as u8
    }

    /// Overwrites `field` with a user-supplied value after checking it against the
    /// field's declared type. Nothing is written when validation fails.
    pub fn apply_correction(&mut self, field: FieldName, raw: &str) -> Result<(), DomainError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(DomainError::EmptyFieldValue { field: field.as_str().to_string() });
        }

        match field {
            FieldName::CompanyName => self.company_name = Some(value.to_string()),
            FieldName::Industry => self.industry = Some(value.to_ascii_lowercase()),
            FieldName::TargetMarket => self.target_market = Some(value.to_string()),
            FieldName::CompanySize => self.company_size = Some(value.parse()?),
            FieldName::Category => self.category = Some(value.parse()?),
            FieldName::Maturity => self.maturity = Some(value.parse()?),
            FieldName::StrategyType => self.strategy_type = Some(value.parse()?),
            FieldName::PrimaryGoal => self.primary_goal = Some(value.parse()?),
            FieldName::TimelineUrgency => self.timeline_urgency = Some(value.parse()?),
            FieldName::Budget => {
                let amount = parse_budget_amount(value).ok_or_else(|| {
                    invalid_value(field, value, "whole USD amount such as 25000, $25,000 or 25k")
                })?;
                self.budget = Some(amount);
            }
            FieldName::HasMarketingTeam => {
                self.has_marketing_team = Some(parse_flag(field, value)?);
            }
            FieldName::WillingToOutsource => {
                self.willing_to_outsource = Some(parse_flag(field, value)?);
            }
            FieldName::TargetRegions => {
                self.target_regions = parse_list(field, &value.to_ascii_uppercase())?;
            }
            FieldName::TargetKpis => self.target_kpis = parse_list(field, value)?,
            FieldName::NeededSpecializations => {
                self.needed_specializations = parse_list(field, value)?;
            }
            FieldName::Challenges => self.challenges = parse_list(field, value)?,
            FieldName::TechStack => self.tech_stack = parse_list(field, value)?,
        }

        Ok(())
    }
}

fn normalize_wire_value(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

fn invalid_value(field: FieldName, value: &str, expected: &str) -> DomainError {
    DomainError::InvalidFieldValue {
        field: field.as_str().to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
}

/// Parses `25000`, `$25,000` or `25k` into whole dollars.
pub fn parse_budget_amount(raw: &str) -> Option<u64> {
    let trimmed = raw.trim().trim_start_matches('$').replace(',', "");
    let (digits, multiplier) = match trimmed.strip_suffix(['k', 'K']) {
        Some(prefix) => (prefix.trim_end(), 1_000u64),
        None => (trimmed.as_str(), 1u64),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

fn parse_flag(field: FieldName, value: &str) -> Result<bool, DomainError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        _ => Err(invalid_value(field, value, "true|false|yes|no")),
    }
}

fn parse_list(field: FieldName, value: &str) -> Result<Vec<String>, DomainError> {
    let mut items: Vec<String> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }
    if items.is_empty() {
        return Err(DomainError::EmptyFieldValue { field: field.as_str().to_string() });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::{
        parse_budget_amount, Category, CompanySize, FieldName, Maturity, Requirements,
        StrategyType,
    };
    use crate::errors::DomainError;

    #[test]
    fn empty_requirements_score_zero() {
        assert_eq!(Requirements::default().completeness_percent(), 0);
    }

    #[test]
    fn completeness_rounds_to_nearest_percent() {
        let mut requirements = Requirements {
            category: Some(Category::B2bSaas),
            budget: Some(20_000),
            strategy_type: Some(StrategyType::SalesLed),
            ..Requirements::default()
        };
        assert_eq!(requirements.completeness_percent(), 43);

        requirements.industry = Some("saas".to_string());
        assert_eq!(requirements.completeness_percent(), 43, "industry and category share one slot");

        requirements.needed_specializations.push("abm".to_string());
        assert_eq!(requirements.completeness_percent(), 57);
    }

    #[test]
    fn zero_budget_counts_as_present() {
        let requirements = Requirements { budget: Some(0), ..Requirements::default() };
        assert_eq!(requirements.completeness_percent(), 14);
    }

    #[test]
    fn fully_populated_requirements_score_one_hundred() {
        let mut requirements = Requirements::default();
        requirements.apply_correction(FieldName::CompanyName, "Acme").expect("name");
        requirements.apply_correction(FieldName::Industry, "Gaming").expect("industry");
        requirements.apply_correction(FieldName::TargetMarket, "mid-market CFOs").expect("market");
        requirements.apply_correction(FieldName::StrategyType, "hybrid").expect("strategy");
        requirements.apply_correction(FieldName::Budget, "$12,500").expect("budget");
        requirements.apply_correction(FieldName::PrimaryGoal, "leads").expect("goal");
        requirements
            .apply_correction(FieldName::NeededSpecializations, "seo, paid")
            .expect("specializations");

        assert_eq!(requirements.completeness_percent(), 100);
        assert_eq!(requirements.industry.as_deref(), Some("gaming"));
        assert_eq!(requirements.budget, Some(12_500));
    }

    #[test]
    fn enum_correction_accepts_loose_spelling() {
        let mut requirements = Requirements::default();
        requirements.apply_correction(FieldName::Category, "B2B SaaS").expect("category");
        requirements.apply_correction(FieldName::Maturity, "pre-launch").expect("maturity");
        requirements.apply_correction(FieldName::CompanySize, "Medium").expect("size");

        assert_eq!(requirements.category, Some(Category::B2bSaas));
        assert_eq!(requirements.maturity, Some(Maturity::PreLaunch));
        assert_eq!(requirements.company_size, Some(CompanySize::Medium));
    }

    #[test]
    fn enum_correction_rejects_values_outside_enumeration() {
        let mut requirements = Requirements::default();
        let error = requirements
            .apply_correction(FieldName::StrategyType, "viral")
            .expect_err("unknown strategy should fail");

        assert!(matches!(
            error,
            DomainError::InvalidFieldValue { ref field, ref expected, .. }
                if field == "strategy_type" && expected == "plg|sales_led|hybrid"
        ));
        assert_eq!(requirements, Requirements::default());
    }

    #[test]
    fn list_correction_replaces_and_deduplicates() {
        let mut requirements = Requirements {
            target_regions: vec!["US".to_string()],
            ..Requirements::default()
        };
        requirements
            .apply_correction(FieldName::TargetRegions, "uk, apac, uk")
            .expect("regions");
        assert_eq!(requirements.target_regions, vec!["UK".to_string(), "APAC".to_string()]);
    }

    #[test]
    fn blank_correction_is_rejected() {
        let mut requirements = Requirements::default();
        let error =
            requirements.apply_correction(FieldName::CompanyName, "   ").expect_err("blank");
        assert!(matches!(error, DomainError::EmptyFieldValue { .. }));

        let error = requirements.apply_correction(FieldName::TechStack, " , ").expect_err("blank");
        assert!(matches!(error, DomainError::EmptyFieldValue { .. }));
    }

    #[test]
    fn boolean_and_budget_corrections_are_type_checked() {
        let mut requirements = Requirements::default();
        requirements.apply_correction(FieldName::HasMarketingTeam, "Yes").expect("flag");
        assert_eq!(requirements.has_marketing_team, Some(true));

        assert!(requirements.apply_correction(FieldName::WillingToOutsource, "maybe").is_err());
        assert!(requirements.apply_correction(FieldName::Budget, "a lot").is_err());
        assert_eq!(requirements.budget, None);
    }

    #[test]
    fn budget_amount_parser_handles_common_forms() {
        assert_eq!(parse_budget_amount("25000"), Some(25_000));
        assert_eq!(parse_budget_amount("$25,000"), Some(25_000));
        assert_eq!(parse_budget_amount("40k"), Some(40_000));
        assert_eq!(parse_budget_amount("$7 K"), Some(7_000));
        assert_eq!(parse_budget_amount("k"), None);
        assert_eq!(parse_budget_amount("-5"), None);
    }

    #[test]
    fn field_names_parse_and_label() {
        assert_eq!("strategy_type".parse::<FieldName>(), Ok(FieldName::StrategyType));
        assert_eq!(FieldName::StrategyType.display_label(), "Strategy Type");
        assert_eq!(FieldName::Budget.display_label(), "Budget");
        assert_eq!(
            "favourite_colour".parse::<FieldName>(),
            Err(DomainError::UnknownField("favourite_colour".to_string()))
        );
    }

    #[test]
    fn only_high_value_fields_require_confirmation() {
        let confirmed = FieldName::ALL
            .into_iter()
            .filter(FieldName::requires_confirmation)
            .collect::<Vec<_>>();
        assert_eq!(
            confirmed,
            vec![
                FieldName::Industry,
                FieldName::Category,
                FieldName::StrategyType,
                FieldName::Budget
            ]
        );
    }

    #[test]
    fn wire_format_uses_snake_case_values() {
        let requirements = Requirements {
            category: Some(Category::B2bSaas),
            maturity: Some(Maturity::PreLaunch),
            ..Requirements::default()
        };
        let json = serde_json::to_value(&requirements).expect("serialize");
        assert_eq!(json["category"], "b2b_saas");
        assert_eq!(json["maturity"], "pre_launch");
        assert_eq!(json["tech_stack"], serde_json::json!([]));
    }
}
