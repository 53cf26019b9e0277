use serde::{Deserialize, Serialize};

/// A recognised tool or brand from the prospect's stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

struct ToolEntry {
    key: &'static str,
    name: &'static str,
    category: &'static str,
    description: &'static str,
}

impl ToolEntry {
    fn matches(&self, lowered_text: &str) -> bool {
        lowered_text.contains(self.key) || lowered_text.contains(&self.name.to_ascii_lowercase())
    }

    fn to_info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.to_string(),
            category: self.category.to_string(),
            description: self.description.to_string(),
            logo_url: None,
        }
    }
}

const KNOWN_TOOLS: &[ToolEntry] = &[
    ToolEntry {
        key: "hubspot",
        name: "HubSpot",
        category: "CRM",
        description: "All-in-one CRM, marketing, sales platform",
    },
    ToolEntry {
        key: "salesforce",
        name: "Salesforce",
        category: "CRM",
        description: "Enterprise CRM and sales cloud",
    },
    ToolEntry {
        key: "pipedrive",
        name: "Pipedrive",
        category: "CRM",
        description: "Sales-focused CRM for small teams",
    },
    ToolEntry {
        key: "clay",
        name: "Clay",
        category: "Sales Intelligence",
        description: "Data enrichment and outbound automation",
    },
    ToolEntry {
        key: "apollo",
        name: "Apollo.io",
        category: "Sales Intelligence",
        description: "B2B database and engagement platform",
    },
    ToolEntry {
        key: "zoominfo",
        name: "ZoomInfo",
        category: "Sales Intelligence",
        description: "B2B contact and company data",
    },
    ToolEntry {
        key: "linkedin",
        name: "LinkedIn Sales Navigator",
        category: "Sales Intelligence",
        description: "LinkedIn's premium sales tool",
    },
    ToolEntry {
        key: "instantly",
        name: "Instantly",
        category: "Email Outreach",
        description: "Cold email automation at scale",
    },
    ToolEntry {
        key: "lemlist",
        name: "Lemlist",
        category: "Email Outreach",
        description: "Personalized cold outreach",
    },
    ToolEntry {
        key: "outreach",
        name: "Outreach",
        category: "Sales Engagement",
        description: "Enterprise sales engagement platform",
    },
    ToolEntry {
        key: "salesloft",
        name: "SalesLoft",
        category: "Sales Engagement",
        description: "Revenue workflow platform",
    },
    ToolEntry {
        key: "mailchimp",
        name: "Mailchimp",
        category: "Email Marketing",
        description: "Email marketing and automation",
    },
    ToolEntry {
        key: "klaviyo",
        name: "Klaviyo",
        category: "Email Marketing",
        description: "E-commerce email and SMS",
    },
    ToolEntry {
        key: "marketo",
        name: "Marketo",
        category: "Marketing Automation",
        description: "Enterprise marketing automation",
    },
    ToolEntry {
        key: "pardot",
        name: "Pardot",
        category: "Marketing Automation",
        description: "Salesforce B2B marketing automation",
    },
    ToolEntry {
        key: "mixpanel",
        name: "Mixpanel",
        category: "Product Analytics",
        description: "Product and user analytics",
    },
    ToolEntry {
        key: "amplitude",
        name: "Amplitude",
        category: "Product Analytics",
        description: "Digital analytics platform",
    },
    ToolEntry {
        key: "segment",
        name: "Segment",
        category: "CDP",
        description: "Customer data platform",
    },
    ToolEntry {
        key: "heap",
        name: "Heap",
        category: "Product Analytics",
        description: "Auto-capture product analytics",
    },
    ToolEntry {
        key: "6sense",
        name: "6sense",
        category: "ABM",
        description: "Account-based marketing platform",
    },
    ToolEntry {
        key: "demandbase",
        name: "Demandbase",
        category: "ABM",
        description: "ABM and B2B advertising",
    },
    ToolEntry {
        key: "terminus",
        name: "Terminus",
        category: "ABM",
        description: "ABM platform for B2B",
    },
];

/// Every known tool mentioned anywhere in `text`, in table order.
///
/// Matching is a case-insensitive substring scan against both the lookup key and
/// the display name, so "Apollo.io" and "apollo" resolve to the same entry.
pub fn recognize_tools(text: &str) -> Vec<ToolInfo> {
    let lowered = text.to_lowercase();
    KNOWN_TOOLS.iter().filter(|entry| entry.matches(&lowered)).map(ToolEntry::to_info).collect()
}

pub fn known_tool_count() -> usize {
    KNOWN_TOOLS.len()
}

#[cfg(test)]
mod tests {
    use super::{known_tool_count, recognize_tools};

    #[test]
    fn recognizes_multiple_tools_in_table_order() {
        let tools = recognize_tools("We run Salesforce with HubSpot forms and some Clay tables");
        let names = tools.iter().map(|tool| tool.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["HubSpot", "Salesforce", "Clay"]);
        assert_eq!(tools[0].category, "CRM");
    }

    #[test]
    fn matches_display_name_as_well_as_key() {
        let tools = recognize_tools("our SDRs live in linkedin sales navigator");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "LinkedIn Sales Navigator");
    }

    #[test]
    fn no_tools_for_plain_text() {
        assert!(recognize_tools("hello there").is_empty());
        assert_eq!(known_tool_count(), 22);
    }
}
