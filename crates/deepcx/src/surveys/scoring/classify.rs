use serde::{Deserialize, Serialize};

use crate::surveys::domain::SurveyMethod;

/// Net Promoter bucket for a 0-10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpsCategory {
    Detractor,
    Passive,
    Promoter,
}

impl NpsCategory {
    pub const fn from_score(score: u8) -> Self {
        match score {
            0..=6 => NpsCategory::Detractor,
            7 | 8 => NpsCategory::Passive,
            _ => NpsCategory::Promoter,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            NpsCategory::Detractor => "Detractor",
            NpsCategory::Passive => "Passive",
            NpsCategory::Promoter => "Promoter",
        }
    }
}

/// Ordered five-step satisfaction scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsatLevel {
    VeryDissatisfied,
    Dissatisfied,
    Neutral,
    Satisfied,
    VerySatisfied,
}

impl CsatLevel {
    pub const ORDERED: [CsatLevel; 5] = [
        CsatLevel::VeryDissatisfied,
        CsatLevel::Dissatisfied,
        CsatLevel::Neutral,
        CsatLevel::Satisfied,
        CsatLevel::VerySatisfied,
    ];

    /// Bucket a value on the 0-10 input scale: `min(floor(score / 2), 4)`.
    pub const fn from_ten_point(score: u8) -> Self {
        let index = score / 2;
        let index = if index > 4 { 4 } else { index };
        Self::ORDERED[index as usize]
    }

    /// Bucket a stored 1-5 rating; out-of-scale values saturate.
    pub const fn from_rating(rating: u8) -> Self {
        let index = match rating {
            0 | 1 => 0,
            2..=5 => rating - 1,
            _ => 4,
        };
        Self::ORDERED[index as usize]
    }

    pub const fn label(self) -> &'static str {
        match self {
            CsatLevel::VeryDissatisfied => "Very Dissatisfied",
            CsatLevel::Dissatisfied => "Dissatisfied",
            CsatLevel::Neutral => "Neutral",
            CsatLevel::Satisfied => "Satisfied",
            CsatLevel::VerySatisfied => "Very Satisfied",
        }
    }
}

/// Classified main score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "bucket")]
pub enum ScoreClass {
    #[serde(rename = "NPS")]
    Nps(NpsCategory),
    #[serde(rename = "CSAT")]
    Csat(CsatLevel),
    #[serde(rename = "STARS")]
    Stars(u8),
}

impl ScoreClass {
    pub fn label(&self) -> String {
        match self {
            ScoreClass::Nps(category) => category.label().to_string(),
            ScoreClass::Csat(level) => level.label().to_string(),
            ScoreClass::Stars(1) => "1 star".to_string(),
            ScoreClass::Stars(count) => format!("{count} stars"),
        }
    }
}

/// Classify a main score for `method`. CSAT uses the 0-10 input scale.
pub fn classify(method: SurveyMethod, score: u8) -> ScoreClass {
    match method {
        SurveyMethod::Nps => ScoreClass::Nps(NpsCategory::from_score(score)),
        SurveyMethod::Csat => ScoreClass::Csat(CsatLevel::from_ten_point(score)),
        SurveyMethod::Stars => ScoreClass::Stars(score),
    }
}

/// Classify a stored main score on its method's own scale (CSAT is 1-5 here).
pub fn classify_stored(method: SurveyMethod, score: u8) -> ScoreClass {
    match method {
        SurveyMethod::Csat => ScoreClass::Csat(CsatLevel::from_rating(score)),
        SurveyMethod::Nps | SurveyMethod::Stars => classify(method, score),
    }
}

/// Per-response main-score lifecycle. Classification is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreState {
    #[default]
    Unscored,
    Scored(u8),
    Classified { score: u8, class: ScoreClass },
}

impl ScoreState {
    /// Record or replace the pending score; a classified score is kept.
    pub fn record(self, score: u8) -> Self {
        match self {
            ScoreState::Unscored | ScoreState::Scored(_) => ScoreState::Scored(score),
            classified @ ScoreState::Classified { .. } => classified,
        }
    }

    pub fn classify(self, method: SurveyMethod) -> Self {
        match self {
            ScoreState::Scored(score) => ScoreState::Classified {
                score,
                class: classify_stored(method, score),
            },
            other => other,
        }
    }

    pub fn score(&self) -> Option<u8> {
        match self {
            ScoreState::Unscored => None,
            ScoreState::Scored(score) | ScoreState::Classified { score, .. } => Some(*score),
        }
    }

    pub fn class(&self) -> Option<ScoreClass> {
        match self {
            ScoreState::Classified { class, .. } => Some(*class),
            _ => None,
        }
    }
}
