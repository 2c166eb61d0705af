use super::domain::{AttributeId, SurveyMethod};

/// User-correctable input problems, surfaced directly to the submitter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("survey title is required")]
    MissingTitle,
    #[error("main question text is required")]
    MissingMainQuestion,
    #[error("a survey accepts at most {limit} attributes")]
    TooManyAttributes { limit: usize },
    #[error("main score is required")]
    MissingMainScore,
    #[error("score {score} is outside the {method} range {min}-{max}")]
    ScoreOutOfRange {
        method: SurveyMethod,
        score: i64,
        min: u8,
        max: u8,
    },
    #[error("attribute '{label}' requires a rating")]
    MissingRequiredAttribute {
        attribute_id: AttributeId,
        label: String,
    },
    #[error("attribute {0} is not part of this survey")]
    UnknownAttribute(AttributeId),
    #[error("custom attributes need an organization, a code and a label")]
    IncompleteAttribute,
    #[error("attribute '{0}' already exists for this organization")]
    DuplicateAttribute(String),
    #[error("contact requests need a name and an email or phone")]
    IncompleteContact,
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("'{0}' is not a valid phone number")]
    InvalidPhone(String),
}

/// Loose `local@domain.tld` shape: no whitespace, one `@`, and a dot in the
/// domain with something on both sides of it.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain
            .char_indices()
            .any(|(index, ch)| ch == '.' && index > 0 && index + 1 < domain.len())
}

/// Accepts 10 to 13 digits once separators and the leading `+` are stripped.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    (10..=13).contains(&digits)
}
