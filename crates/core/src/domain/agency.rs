use serde::{Deserialize, Serialize};

/// A ranked agency returned by the matching service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyMatch {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub headquarters: String,
    pub specializations: Vec<String>,
    #[serde(default)]
    pub min_budget: Option<u64>,
    pub match_score: i64,
    #[serde(default)]
    pub match_reasons: Vec<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Parameters sent to the matching service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencySearchQuery {
    pub specializations: Vec<String>,
    pub category_tags: Vec<String>,
    pub service_areas: Vec<String>,
    pub max_budget: Option<u64>,
    pub limit: u32,
}
