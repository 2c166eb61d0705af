use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::attributes::{add_attribute, remove_attribute, MAX_SURVEY_ATTRIBUTES};
use super::color::normalize_hex_color;
use crate::surveys::domain::{AttributeId, Branding, SurveyMethod};
use crate::surveys::validation::ValidationError;

pub const DEFAULT_COMMENT_LABEL: &str = "Anything else you would like to tell us?";

/// Administrator's in-progress survey configuration.
///
/// The main question follows the selected method's default until the
/// administrator edits it; after that, method changes leave it alone.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyDraft {
    pub title: String,
    pub comment_label: String,
    pub show_logo: bool,
    pub logo_url: Option<String>,
    pub primary_color: String,
    /// Owner whose custom attributes may be selected alongside the system ones.
    pub organization_id: Option<String>,
    method: SurveyMethod,
    main_question: String,
    question_edited: bool,
    attributes: Vec<AttributeId>,
    required: BTreeSet<AttributeId>,
}

impl SurveyDraft {
    pub fn new(title: impl Into<String>) -> Self {
        let method = SurveyMethod::Nps;
        Self {
            title: title.into(),
            comment_label: DEFAULT_COMMENT_LABEL.to_string(),
            show_logo: false,
            logo_url: None,
            primary_color: String::new(),
            organization_id: None,
            method,
            main_question: method.default_question().to_string(),
            question_edited: false,
            attributes: Vec::new(),
            required: BTreeSet::new(),
        }
    }

    pub fn method(&self) -> SurveyMethod {
        self.method
    }

    pub fn set_method(&mut self, method: SurveyMethod) {
        self.method = method;
        if !self.question_edited {
            self.main_question = method.default_question().to_string();
        }
    }

    pub fn main_question(&self) -> &str {
        &self.main_question
    }

    pub fn edit_main_question(&mut self, text: impl Into<String>) {
        self.main_question = text.into();
        self.question_edited = true;
    }

    pub fn question_edited(&self) -> bool {
        self.question_edited
    }

    pub fn attributes(&self) -> &[AttributeId] {
        &self.attributes
    }

    /// Returns whether the attribute is selected afterwards.
    pub fn select_attribute(&mut self, id: &AttributeId) -> bool {
        self.attributes = add_attribute(&self.attributes, id, MAX_SURVEY_ATTRIBUTES);
        self.attributes.contains(id)
    }

    pub fn deselect_attribute(&mut self, id: &AttributeId) {
        self.attributes = remove_attribute(&self.attributes, id);
        self.required.remove(id);
    }

    /// Only selected attributes can be marked required.
    pub fn set_required(&mut self, id: &AttributeId, required: bool) {
        if required && self.attributes.contains(id) {
            self.required.insert(id.clone());
        } else {
            self.required.remove(id);
        }
    }

    pub fn is_required(&self, id: &AttributeId) -> bool {
        self.required.contains(id)
    }

    /// Produce the normalized definition, using `fallback_color` for bad colors.
    pub fn finalize(&self, fallback_color: &str) -> Result<SurveyDefinition, ValidationError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }

        let main_question = self.main_question.trim();
        if main_question.is_empty() {
            return Err(ValidationError::MissingMainQuestion);
        }

        if self.attributes.len() > MAX_SURVEY_ATTRIBUTES {
            return Err(ValidationError::TooManyAttributes {
                limit: MAX_SURVEY_ATTRIBUTES,
            });
        }

        let comment_label = match self.comment_label.trim() {
            "" => DEFAULT_COMMENT_LABEL.to_string(),
            label => label.to_string(),
        };

        let logo_url = self
            .logo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        let attributes = self
            .attributes
            .iter()
            .map(|id| AttributeChoice {
                attribute_id: id.clone(),
                required: self.required.contains(id),
            })
            .collect();

        Ok(SurveyDefinition {
            title: title.to_string(),
            method: self.method,
            main_question: main_question.to_string(),
            comment_label,
            branding: Branding {
                show_logo: self.show_logo && logo_url.is_some(),
                logo_url,
                primary_color: normalize_hex_color(&self.primary_color, fallback_color),
            },
            attributes,
        })
    }
}

/// Attribute selection carried into persistence, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChoice {
    pub attribute_id: AttributeId,
    #[serde(default)]
    pub required: bool,
}

/// Validated, normalized survey configuration ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyDefinition {
    pub title: String,
    pub method: SurveyMethod,
    pub main_question: String,
    pub comment_label: String,
    pub branding: Branding,
    pub attributes: Vec<AttributeChoice>,
}

/// Admin API payload for a new survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSurveyRequest {
    pub title: String,
    pub method: SurveyMethod,
    #[serde(default)]
    pub main_question: Option<String>,
    #[serde(default)]
    pub comment_label: Option<String>,
    #[serde(default)]
    pub show_logo: bool,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeChoice>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

impl TryFrom<CreateSurveyRequest> for SurveyDraft {
    type Error = ValidationError;

    fn try_from(request: CreateSurveyRequest) -> Result<Self, Self::Error> {
        if request.attributes.len() > MAX_SURVEY_ATTRIBUTES {
            return Err(ValidationError::TooManyAttributes {
                limit: MAX_SURVEY_ATTRIBUTES,
            });
        }

        let mut draft = SurveyDraft::new(request.title);
        draft.set_method(request.method);
        if let Some(question) = request.main_question {
            draft.edit_main_question(question);
        }
        if let Some(label) = request.comment_label {
            draft.comment_label = label;
        }
        draft.show_logo = request.show_logo;
        draft.logo_url = request.logo_url;
        draft.primary_color = request.primary_color.unwrap_or_default();
        draft.organization_id = request
            .organization_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        for choice in &request.attributes {
            if draft.select_attribute(&choice.attribute_id) {
                draft.set_required(&choice.attribute_id, choice.required);
            }
        }
        Ok(draft)
    }
}
