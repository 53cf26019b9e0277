use serde::{Deserialize, Serialize};

/// Market statistics shown when a prospect names their industry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryData {
    pub industry: String,
    pub market_size: String,
    pub growth_rate: String,
    pub key_segments: Vec<String>,
    pub top_players: Vec<String>,
}

struct IndustryEntry {
    keys: &'static [&'static str],
    industry: &'static str,
    market_size: &'static str,
    growth_rate: &'static str,
    key_segments: &'static [&'static str],
    top_players: &'static [&'static str],
}

impl IndustryEntry {
    fn to_data(&self) -> IndustryData {
        IndustryData {
            industry: self.industry.to_string(),
            market_size: self.market_size.to_string(),
            growth_rate: self.growth_rate.to_string(),
            key_segments: self.key_segments.iter().map(|s| s.to_string()).collect(),
            top_players: self.top_players.iter().map(|s| s.to_string()).collect(),
        }
    }
}

const INDUSTRIES: &[IndustryEntry] = &[
    IndustryEntry {
        keys: &["gaming", "games"],
        industry: "Gaming",
        market_size: "$200B+ globally",
        growth_rate: "8.4% CAGR",
        key_segments: &["Mobile Gaming", "Console", "PC", "Cloud Gaming"],
        top_players: &["Tencent", "Sony", "Microsoft", "Nintendo", "Activision"],
    },
    IndustryEntry {
        keys: &["fintech"],
        industry: "FinTech",
        market_size: "$310B globally",
        growth_rate: "25% CAGR",
        key_segments: &["Payments", "Lending", "InsurTech", "WealthTech", "RegTech"],
        top_players: &["Stripe", "Square", "PayPal", "Plaid", "Revolut"],
    },
    IndustryEntry {
        keys: &["healthcare", "healthtech"],
        industry: "Healthcare Tech",
        market_size: "$350B globally",
        growth_rate: "15% CAGR",
        key_segments: &["Telehealth", "EHR", "Medical Devices", "Digital Therapeutics"],
        top_players: &["Epic", "Cerner", "Teladoc", "Veeva", "Doximity"],
    },
    IndustryEntry {
        keys: &["edtech"],
        industry: "EdTech",
        market_size: "$250B globally",
        growth_rate: "16% CAGR",
        key_segments: &["K-12", "Higher Ed", "Corporate Training", "Language Learning"],
        top_players: &["Coursera", "Duolingo", "Byju's", "2U", "Udemy"],
    },
    IndustryEntry {
        keys: &["saas"],
        industry: "SaaS",
        market_size: "$200B globally",
        growth_rate: "18% CAGR",
        key_segments: &["Horizontal SaaS", "Vertical SaaS", "Infrastructure", "Security"],
        top_players: &["Salesforce", "Microsoft", "Adobe", "ServiceNow", "Workday"],
    },
    IndustryEntry {
        keys: &["b2b saas"],
        industry: "B2B SaaS",
        market_size: "$150B globally",
        growth_rate: "18% CAGR",
        key_segments: &["Sales Tech", "Marketing Tech", "HR Tech", "FinOps"],
        top_players: &["Salesforce", "HubSpot", "Slack", "Zoom", "Atlassian"],
    },
    IndustryEntry {
        keys: &["ecommerce"],
        industry: "E-commerce",
        market_size: "$6T globally",
        growth_rate: "10% CAGR",
        key_segments: &["B2C", "B2B", "D2C", "Marketplaces"],
        top_players: &["Amazon", "Alibaba", "Shopify", "eBay", "Etsy"],
    },
    IndustryEntry {
        keys: &["ai"],
        industry: "Artificial Intelligence",
        market_size: "$150B globally",
        growth_rate: "38% CAGR",
        key_segments: &["GenAI", "ML Ops", "Computer Vision", "NLP", "Robotics"],
        top_players: &["OpenAI", "Google", "Microsoft", "Anthropic", "NVIDIA"],
    },
];

/// Looks up market data by industry key, ignoring case and surrounding whitespace.
pub fn industry_data(industry: &str) -> Option<IndustryData> {
    let key = industry.trim().to_lowercase();
    INDUSTRIES.iter().find(|entry| entry.keys.contains(&key.as_str())).map(IndustryEntry::to_data)
}

#[cfg(test)]
mod tests {
    use super::industry_data;

    #[test]
    fn aliases_resolve_to_the_same_record() {
        let gaming = industry_data("gaming").expect("gaming");
        let games = industry_data("Games ").expect("games alias");
        assert_eq!(gaming, games);
        assert_eq!(gaming.growth_rate, "8.4% CAGR");
        assert_eq!(gaming.top_players.first().map(String::as_str), Some("Tencent"));
    }

    #[test]
    fn distinguishes_saas_from_b2b_saas() {
        assert_eq!(industry_data("saas").map(|d| d.industry), Some("SaaS".to_string()));
        assert_eq!(industry_data("B2B SaaS").map(|d| d.industry), Some("B2B SaaS".to_string()));
    }

    #[test]
    fn unknown_industry_has_no_data() {
        assert_eq!(industry_data("agritech"), None);
    }
}
