use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::classify::NpsCategory;
use crate::surveys::domain::{AttributeId, RatingLevel, SurveyId, SurveyMethod};

/// Minimum 1-5 score counted as satisfied.
pub const SATISFIED_THRESHOLD: u8 = 4;

/// `round(((promoters - detractors) / total) * 100)`, 0 for an empty set.
pub fn nps_score(scores: &[u8]) -> i32 {
    let breakdown = NpsBreakdown::from_scores(scores);
    breakdown.score()
}

/// Mean score rounded to two decimals, 0 for an empty set.
pub fn csat_average(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let sum: i64 = scores.iter().map(|score| i64::from(*score)).sum();
    round_half_up(sum * 100, scores.len() as i64) as f64 / 100.0
}

/// Percentage of scores at or above [`SATISFIED_THRESHOLD`], 0 for an empty set.
pub fn satisfaction_rate(scores: &[u8]) -> u32 {
    if scores.is_empty() {
        return 0;
    }
    let satisfied = satisfied_count(scores);
    round_half_up(i64::from(satisfied) * 100, scores.len() as i64) as u32
}

fn satisfied_count(scores: &[u8]) -> u32 {
    scores
        .iter()
        .filter(|score| **score >= SATISFIED_THRESHOLD)
        .count() as u32
}

/// Mean rating per attribute; attributes without ratings are absent.
pub fn attribute_averages(ratings: &[(AttributeId, RatingLevel)]) -> Vec<AttributeAverage> {
    let mut totals: BTreeMap<&AttributeId, (u32, u32)> = BTreeMap::new();
    for (attribute_id, rating) in ratings {
        let entry = totals.entry(attribute_id).or_default();
        entry.0 += u32::from(rating.value());
        entry.1 += 1;
    }

    totals
        .into_iter()
        .map(|(attribute_id, (sum, samples))| AttributeAverage {
            attribute_id: attribute_id.clone(),
            average: f64::from(sum) / f64::from(samples),
            samples,
        })
        .collect()
}

// Nearest integer to numerator / denominator, ties toward positive infinity.
fn round_half_up(numerator: i64, denominator: i64) -> i64 {
    debug_assert!(denominator > 0);
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

/// Promoter/passive/detractor counts behind an NPS value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NpsBreakdown {
    pub promoters: u32,
    pub passives: u32,
    pub detractors: u32,
}

impl NpsBreakdown {
    pub fn from_scores(scores: &[u8]) -> Self {
        scores
            .iter()
            .fold(Self::default(), |mut acc, score| {
                match NpsCategory::from_score(*score) {
                    NpsCategory::Promoter => acc.promoters += 1,
                    NpsCategory::Passive => acc.passives += 1,
                    NpsCategory::Detractor => acc.detractors += 1,
                }
                acc
            })
    }

    pub fn total(&self) -> u32 {
        self.promoters + self.passives + self.detractors
    }

    pub fn score(&self) -> i32 {
        let total = i64::from(self.total());
        if total == 0 {
            return 0;
        }
        let net = i64::from(self.promoters) - i64::from(self.detractors);
        round_half_up(net * 100, total) as i32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeAverage {
    pub attribute_id: AttributeId,
    pub average: f64,
    pub samples: u32,
}

/// Aggregate view of one survey's responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyMetrics {
    pub survey_id: SurveyId,
    pub method: SurveyMethod,
    pub total_responses: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nps_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nps_breakdown: Option<NpsBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csat_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaction_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfied_count: Option<u32>,
    pub score_distribution: BTreeMap<u8, u32>,
    pub attribute_averages: Vec<AttributeAverage>,
}

/// Build the metrics for `method` from raw main scores and attribute ratings.
///
/// NPS surveys report the net score; CSAT and STARS surveys report the
/// average and satisfaction rate on their 1-5 scale.
pub fn summarize(
    survey_id: SurveyId,
    method: SurveyMethod,
    scores: &[u8],
    ratings: &[(AttributeId, RatingLevel)],
) -> SurveyMetrics {
    let mut score_distribution = BTreeMap::new();
    for score in scores {
        *score_distribution.entry(*score).or_insert(0u32) += 1;
    }

    let (nps_score, nps_breakdown, csat_average, satisfaction, satisfied) = match method {
        SurveyMethod::Nps => {
            let breakdown = NpsBreakdown::from_scores(scores);
            (Some(breakdown.score()), Some(breakdown), None, None, None)
        }
        SurveyMethod::Csat | SurveyMethod::Stars => (
            None,
            None,
            Some(csat_average(scores)),
            Some(satisfaction_rate(scores)),
            Some(satisfied_count(scores)),
        ),
    };

    SurveyMetrics {
        survey_id,
        method,
        total_responses: scores.len() as u32,
        nps_score,
        nps_breakdown,
        csat_average,
        satisfaction_rate: satisfaction,
        satisfied_count: satisfied,
        score_distribution,
        attribute_averages: attribute_averages(ratings),
    }
}
