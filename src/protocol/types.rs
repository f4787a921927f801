use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ticket categories the assistant is allowed to propose.
///
/// Parsing is case-insensitive so that `"bug report"` from a sloppy
/// completion still lands on [`Category::BugReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Category {
    #[serde(rename = "Technical Issue")]
    TechnicalIssue,
    #[serde(rename = "Account Problem")]
    AccountProblem,
    #[serde(rename = "Billing Question")]
    BillingQuestion,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    #[serde(rename = "Bug Report")]
    BugReport,
    #[serde(rename = "General Inquiry")]
    GeneralInquiry,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::TechnicalIssue,
        Category::AccountProblem,
        Category::BillingQuestion,
        Category::FeatureRequest,
        Category::BugReport,
        Category::GeneralInquiry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TechnicalIssue => "Technical Issue",
            Self::AccountProblem => "Account Problem",
            Self::BillingQuestion => "Billing Question",
            Self::FeatureRequest => "Feature Request",
            Self::BugReport => "Bug Report",
            Self::GeneralInquiry => "General Inquiry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant::new("category", s))
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownVariant::new("priority", s))
    }
}

impl TryFrom<String> for Priority {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Structured fields collected by the conversation. Doubles as the
/// ticket-ingestion payload, so the wire names match the marker exactly.
/// Keys outside the six are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TicketDraft {
    pub user_name: String,
    pub email: String,
    pub category: Category,
    pub priority: Priority,
    pub title: String,
    pub description: String,
}

impl TicketDraft {
    /// Returns the wire name of the first required text field that is blank.
    pub fn first_blank_field(&self) -> Option<&'static str> {
        [
            ("userName", &self.user_name),
            ("email", &self.email),
            ("title", &self.title),
            ("description", &self.description),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}
