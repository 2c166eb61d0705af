use super::definition::{DEFAULT_PRIMARY_COLOR, INSTANCE_CODE_PREFIX, SURVEY_CODE_PREFIX};

/// Operator dials for survey creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveySettings {
    /// Branding color used when an administrator supplies an invalid one.
    pub primary_color: String,
    pub survey_code_prefix: char,
    pub instance_code_prefix: char,
    /// Attempts to find an unused code before giving up.
    pub code_retries: u8,
}

impl Default for SurveySettings {
    fn default() -> Self {
        Self {
            primary_color: DEFAULT_PRIMARY_COLOR.to_string(),
            survey_code_prefix: SURVEY_CODE_PREFIX,
            instance_code_prefix: INSTANCE_CODE_PREFIX,
            code_retries: 5,
        }
    }
}
