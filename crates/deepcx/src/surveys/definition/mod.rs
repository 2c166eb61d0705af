//! Administrator-side survey configuration: branding, attribute selection, and codes.

mod attributes;
mod codes;
mod color;
mod draft;

pub use attributes::{add_attribute, remove_attribute, MAX_SURVEY_ATTRIBUTES};
pub use codes::{
    generate_code, generate_instance_code, generate_survey_code, is_well_formed_code,
    INSTANCE_CODE_PREFIX, SURVEY_CODE_PREFIX,
};
pub use color::{
    contrast_text_color, hex_to_rgb, normalize_hex_color, Rgb, DARK_TEXT,
    DEFAULT_PRIMARY_COLOR, LIGHT_TEXT,
};
pub use draft::{
    AttributeChoice, CreateSurveyRequest, SurveyDefinition, SurveyDraft, DEFAULT_COMMENT_LABEL,
};
