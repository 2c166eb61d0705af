use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{AttributeId, DateRange, RatingLevel, SurveyId, SurveyMethod};
use super::scoring::{summarize, SurveyMetrics};

const SCORE_COLUMN: &str = "score";
const CREATED_AT_COLUMN: &str = "created_at";
const ATTRIBUTE_COLUMN_PREFIX: &str = "attribute:";

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingScoreColumn,
    InvalidScore {
        line: u64,
        value: String,
        method: SurveyMethod,
    },
    InvalidRating {
        line: u64,
        column: String,
        value: String,
    },
    InvalidTimestamp {
        line: u64,
        value: String,
    },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read response export: {}", err),
            ImportError::Csv(err) => write!(f, "invalid response CSV data: {}", err),
            ImportError::MissingScoreColumn => {
                write!(f, "response export has no `{}` column", SCORE_COLUMN)
            }
            ImportError::InvalidScore {
                line,
                value,
                method,
            } => {
                let range = method.score_range();
                write!(
                    f,
                    "line {}: score `{}` is not a {} value between {} and {}",
                    line,
                    value,
                    method.code(),
                    range.start(),
                    range.end()
                )
            }
            ImportError::InvalidRating {
                line,
                column,
                value,
            } => write!(f, "line {}: `{}` rating `{}` is not a number", line, column, value),
            ImportError::InvalidTimestamp { line, value } => {
                write!(f, "line {}: unrecognised timestamp `{}`", line, value)
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// One exported response.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedResponse {
    pub main_score: u8,
    pub created_at: Option<DateTime<Utc>>,
    pub ratings: Vec<(AttributeId, RatingLevel)>,
}

/// Responses read from an export, ready for the metrics engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedResponses {
    pub method: SurveyMethod,
    pub responses: Vec<ImportedResponse>,
}

impl ImportedResponses {
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Metrics over the imported rows. With a range, rows lacking a timestamp are left out.
    pub fn metrics(&self, survey_id: SurveyId, range: Option<&DateRange>) -> SurveyMetrics {
        let selected: Vec<&ImportedResponse> = self
            .responses
            .iter()
            .filter(|response| match range {
                Some(range) => response.created_at.is_some_and(|at| range.contains(at)),
                None => true,
            })
            .collect();

        let scores: Vec<u8> = selected.iter().map(|response| response.main_score).collect();
        let ratings: Vec<(AttributeId, RatingLevel)> = selected
            .iter()
            .flat_map(|response| response.ratings.iter().cloned())
            .collect();

        summarize(survey_id, self.method, &scores, &ratings)
    }
}

/// Reads response exports: a `score` column, optional `created_at`, and
/// one `attribute:<code>` column per rated attribute.
pub struct ResponseCsvImporter;

impl ResponseCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        method: SurveyMethod,
    ) -> Result<ImportedResponses, ImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, method)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        method: SurveyMethod,
    ) -> Result<ImportedResponses, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let score_index = headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(SCORE_COLUMN))
            .ok_or(ImportError::MissingScoreColumn)?;
        let created_index = headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(CREATED_AT_COLUMN));
        let attribute_columns: Vec<(usize, &str, AttributeId)> = headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                header
                    .strip_prefix(ATTRIBUTE_COLUMN_PREFIX)
                    .map(str::trim)
                    .filter(|code| !code.is_empty())
                    .map(|code| (index, header, AttributeId(code.to_string())))
            })
            .collect();

        let mut responses = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |position| position.line());

            let raw_score = record.get(score_index).unwrap_or_default();
            let main_score = parse_score(raw_score, method).ok_or_else(|| {
                ImportError::InvalidScore {
                    line,
                    value: raw_score.to_string(),
                    method,
                }
            })?;

            let created_at = match created_index.and_then(|index| record.get(index)) {
                Some(raw) if !raw.is_empty() => {
                    Some(parse_timestamp(raw).ok_or_else(|| ImportError::InvalidTimestamp {
                        line,
                        value: raw.to_string(),
                    })?)
                }
                _ => None,
            };

            let mut ratings = Vec::with_capacity(attribute_columns.len());
            for (index, column, attribute_id) in &attribute_columns {
                let raw = record.get(*index).unwrap_or_default();
                if raw.is_empty() {
                    continue;
                }
                let value: f64 = raw.parse().map_err(|_| ImportError::InvalidRating {
                    line,
                    column: column.to_string(),
                    value: raw.to_string(),
                })?;
                ratings.push((attribute_id.clone(), RatingLevel::clamp(value)));
            }

            responses.push(ImportedResponse {
                main_score,
                created_at,
                ratings,
            });
        }

        Ok(ImportedResponses { method, responses })
    }
}

fn parse_score(raw: &str, method: SurveyMethod) -> Option<u8> {
    raw.parse::<u8>()
        .ok()
        .filter(|score| method.score_range().contains(score))
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
