use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted surveys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurveyId(pub String);

/// Identifier wrapper for distribution instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub String);

/// Identifier wrapper for evaluation attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeId(pub String);

/// Identifier wrapper for respondent submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResponseId(pub String);

/// Physical location a distribution instance may be attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(pub String);

impl fmt::Display for SurveyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scoring method selected for a survey's main question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurveyMethod {
    #[serde(rename = "NPS")]
    Nps,
    #[serde(rename = "CSAT")]
    Csat,
    #[serde(rename = "STARS")]
    Stars,
}

impl SurveyMethod {
    pub const fn code(self) -> &'static str {
        match self {
            SurveyMethod::Nps => "NPS",
            SurveyMethod::Csat => "CSAT",
            SurveyMethod::Stars => "STARS",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SurveyMethod::Nps => "Net Promoter Score",
            SurveyMethod::Csat => "Customer Satisfaction",
            SurveyMethod::Stars => "Star rating",
        }
    }

    /// Inclusive range a submitted main score must fall in.
    pub const fn score_range(self) -> RangeInclusive<u8> {
        match self {
            SurveyMethod::Nps => 0..=10,
            SurveyMethod::Csat | SurveyMethod::Stars => 1..=5,
        }
    }

    pub const fn max_score(self) -> u8 {
        *self.score_range().end()
    }

    /// Main question offered until an administrator writes their own.
    pub const fn default_question(self) -> &'static str {
        match self {
            SurveyMethod::Nps => "How likely are you to recommend us to a friend or colleague?",
            SurveyMethod::Csat => "How satisfied are you with your experience today?",
            SurveyMethod::Stars => "How would you rate your experience?",
        }
    }
}

impl fmt::Display for SurveyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown survey method '{0}' (expected NPS, CSAT or STARS)")]
pub struct UnknownMethod(pub String);

impl FromStr for SurveyMethod {
    type Err = UnknownMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NPS" => Ok(SurveyMethod::Nps),
            "CSAT" => Ok(SurveyMethod::Csat),
            "STARS" | "STAR" => Ok(SurveyMethod::Stars),
            _ => Err(UnknownMethod(value.to_string())),
        }
    }
}

/// Lifecycle of a survey definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    Draft,
    Active,
    Paused,
    Archived,
}

impl SurveyStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SurveyStatus::Draft => "draft",
            SurveyStatus::Active => "active",
            SurveyStatus::Paused => "paused",
            SurveyStatus::Archived => "archived",
        }
    }
}

/// Channel an instance is distributed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignType {
    #[default]
    Qr,
    Link,
    Email,
    Whatsapp,
}

/// Logo and color settings rendered on the respondent page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branding {
    pub show_logo: bool,
    pub logo_url: Option<String>,
    pub primary_color: String,
}

/// Persisted survey definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: SurveyId,
    pub survey_code: String,
    pub title: String,
    pub method: SurveyMethod,
    pub main_question: String,
    pub comment_label: String,
    pub branding: Branding,
    pub status: SurveyStatus,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Survey row before the store assigns its id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSurvey {
    pub survey_code: String,
    pub title: String,
    pub method: SurveyMethod,
    pub main_question: String,
    pub comment_label: String,
    pub branding: Branding,
    pub status: SurveyStatus,
    pub created_by: Option<String>,
}

/// Named distribution channel bound to exactly one survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyInstance {
    pub id: InstanceId,
    pub survey_id: SurveyId,
    pub instance_code: String,
    pub store_id: Option<StoreId>,
    pub name: Option<String>,
    pub campaign_type: CampaignType,
    pub qr_location: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SurveyInstance {
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |expiry| now < expiry)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSurveyInstance {
    pub survey_id: SurveyId,
    pub instance_code: String,
    pub store_id: Option<StoreId>,
    pub name: Option<String>,
    pub campaign_type: CampaignType,
    pub qr_location: Option<String>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Reusable secondary evaluation dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub organization_id: Option<String>,
    pub code: String,
    pub label: String,
    pub is_system: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttribute {
    pub organization_id: Option<String>,
    pub code: String,
    pub label: String,
    pub is_system: bool,
}

/// Fixed attribute catalogue offered to every organization.
pub const SYSTEM_ATTRIBUTES: [(&str, &str); 9] = [
    ("service", "Service"),
    ("price", "Price"),
    ("wait_time", "Wait time"),
    ("quality", "Product quality"),
    ("cleanliness", "Cleanliness"),
    ("environment", "Store environment"),
    ("payment", "Ease of payment"),
    ("availability", "Product availability"),
    ("post_sale", "After-sales support"),
];

/// Attribute bound to a survey with its display order and required flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyAttribute {
    pub survey_id: SurveyId,
    pub attribute: Attribute,
    pub position: u8,
    pub is_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSurveyAttribute {
    pub survey_id: SurveyId,
    pub attribute_id: AttributeId,
    pub position: u8,
    pub is_required: bool,
}

/// Name plus at least one reachable channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Transport details captured alongside a submission.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub ip_address: String,
    pub user_agent: String,
}

/// Immutable respondent submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub survey_id: SurveyId,
    pub instance_id: Option<InstanceId>,
    pub store_id: Option<StoreId>,
    pub main_score: u8,
    pub comment: Option<String>,
    pub contact: Option<ContactRequest>,
    pub metadata: RequestMetadata,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResponse {
    pub survey_id: SurveyId,
    pub instance_id: Option<InstanceId>,
    pub store_id: Option<StoreId>,
    pub main_score: u8,
    pub comment: Option<String>,
    pub contact: Option<ContactRequest>,
    pub metadata: RequestMetadata,
}

/// Coarse attribute rating: bad, neutral or good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RatingLevel {
    Bad = 1,
    Neutral = 2,
    Good = 3,
}

impl RatingLevel {
    /// Clamp any raw input into the 1..=3 scale; NaN counts as bad.
    pub fn clamp(raw: f64) -> Self {
        if raw.is_nan() || raw < 2.0 {
            RatingLevel::Bad
        } else if raw < 3.0 {
            RatingLevel::Neutral
        } else {
            RatingLevel::Good
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            RatingLevel::Bad => "bad",
            RatingLevel::Neutral => "neutral",
            RatingLevel::Good => "good",
        }
    }
}

impl From<RatingLevel> for u8 {
    fn from(level: RatingLevel) -> Self {
        level.value()
    }
}

impl TryFrom<u8> for RatingLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RatingLevel::Bad),
            2 => Ok(RatingLevel::Neutral),
            3 => Ok(RatingLevel::Good),
            other => Err(format!("attribute rating must be 1, 2 or 3 (found {other})")),
        }
    }
}

/// One (response, attribute) rating row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRatingRecord {
    pub id: String,
    pub response_id: ResponseId,
    pub attribute_id: AttributeId,
    pub rating: RatingLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttributeRating {
    pub response_id: ResponseId,
    pub attribute_id: AttributeId,
    pub rating: RatingLevel,
}

/// Raw respondent input as received from the public form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseSubmission {
    pub survey_id: SurveyId,
    #[serde(default)]
    pub instance_id: Option<InstanceId>,
    #[serde(default)]
    pub main_score: Option<i64>,
    #[serde(default)]
    pub attribute_scores: BTreeMap<AttributeId, f64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub wants_contact: bool,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

/// Inclusive calendar window used to restrict metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}
