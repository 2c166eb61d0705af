use super::domain::{
    AttributeId, ContactRequest, NewResponse, RatingLevel, RequestMetadata, ResponseSubmission,
    Survey, SurveyAttribute, SurveyInstance,
};
use super::scoring::{ScoreClass, ScoreState};
use super::validation::{is_valid_email, is_valid_phone, ValidationError};

/// Submission that passed every rule and can be written.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmittedResponse {
    pub response: NewResponse,
    pub ratings: Vec<(AttributeId, RatingLevel)>,
    pub class: ScoreClass,
}

/// Validates raw submissions against one survey's definition.
#[derive(Debug, Clone, Copy)]
pub struct ResponseGuard<'a> {
    survey: &'a Survey,
    attributes: &'a [SurveyAttribute],
}

impl<'a> ResponseGuard<'a> {
    pub fn new(survey: &'a Survey, attributes: &'a [SurveyAttribute]) -> Self {
        Self { survey, attributes }
    }

    /// Check the submission without touching storage.
    pub fn admit(
        &self,
        submission: ResponseSubmission,
        instance: Option<&SurveyInstance>,
        metadata: RequestMetadata,
    ) -> Result<AdmittedResponse, ValidationError> {
        let state = ScoreState::Unscored.record(self.main_score(submission.main_score)?);
        let state = state.classify(self.survey.method);
        let (Some(main_score), Some(class)) = (state.score(), state.class()) else {
            return Err(ValidationError::MissingMainScore);
        };

        let ratings = self.ratings(&submission)?;
        let contact = contact_from(&submission)?;
        let comment = submission
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Ok(AdmittedResponse {
            response: NewResponse {
                survey_id: self.survey.id.clone(),
                instance_id: instance.map(|instance| instance.id.clone()),
                store_id: instance.and_then(|instance| instance.store_id.clone()),
                main_score,
                comment,
                contact,
                metadata,
            },
            ratings,
            class,
        })
    }

    fn main_score(&self, raw: Option<i64>) -> Result<u8, ValidationError> {
        let score = raw.ok_or(ValidationError::MissingMainScore)?;
        let method = self.survey.method;
        let range = method.score_range();
        match u8::try_from(score) {
            Ok(value) if range.contains(&value) => Ok(value),
            _ => Err(ValidationError::ScoreOutOfRange {
                method,
                score,
                min: *range.start(),
                max: *range.end(),
            }),
        }
    }

    fn ratings(
        &self,
        submission: &ResponseSubmission,
    ) -> Result<Vec<(AttributeId, RatingLevel)>, ValidationError> {
        if let Some(unknown) = submission.attribute_scores.keys().find(|id| {
            !self
                .attributes
                .iter()
                .any(|bound| &bound.attribute.id == *id)
        }) {
            return Err(ValidationError::UnknownAttribute(unknown.clone()));
        }

        let mut bound: Vec<&SurveyAttribute> = self.attributes.iter().collect();
        bound.sort_by_key(|attribute| attribute.position);

        let mut ratings = Vec::with_capacity(submission.attribute_scores.len());
        for attribute in bound {
            match submission.attribute_scores.get(&attribute.attribute.id) {
                Some(raw) => ratings.push((attribute.attribute.id.clone(), RatingLevel::clamp(*raw))),
                None if attribute.is_required => {
                    return Err(ValidationError::MissingRequiredAttribute {
                        attribute_id: attribute.attribute.id.clone(),
                        label: attribute.attribute.label.clone(),
                    })
                }
                None => {}
            }
        }
        Ok(ratings)
    }
}

fn contact_from(submission: &ResponseSubmission) -> Result<Option<ContactRequest>, ValidationError> {
    if !submission.wants_contact {
        return Ok(None);
    }

    let clean = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    };
    let name = clean(&submission.contact_name);
    let email = clean(&submission.contact_email);
    let phone = clean(&submission.contact_phone);

    let Some(name) = name else {
        return Err(ValidationError::IncompleteContact);
    };
    if email.is_none() && phone.is_none() {
        return Err(ValidationError::IncompleteContact);
    }
    if let Some(email) = email.as_deref().filter(|email| !is_valid_email(email)) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    if let Some(phone) = phone.as_deref().filter(|phone| !is_valid_phone(phone)) {
        return Err(ValidationError::InvalidPhone(phone.to_string()));
    }

    Ok(Some(ContactRequest { name, email, phone }))
}
